use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn root() -> &'static str {
    tracing::info!("Hello from Acquisitions API!");
    "Hello from Acquisitions API!"
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

pub async fn api_status() -> impl IntoResponse {
    Json(json!({ "message": "Acquisitions API is running" }))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Not Found", "message": "Endpoint not found" })),
    )
}
