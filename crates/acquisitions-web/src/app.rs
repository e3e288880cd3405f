use axum::http::{header, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, system};
use crate::middleware;
use crate::pipeline::{self, Access, Gate};
use crate::state::AppState;

const BODY_LIMIT: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Per-IP limiter only on the credential endpoints
    let auth_routes = middleware::rate_limit::with_login_limit(
        api::auth_router(),
        state.config.rate_limit.login_requests_per_minute,
        state.config.rate_limit.trust_proxy_headers,
    )?;

    let base_router = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/api", get(system::api_status))
        .nest("/api/auth", auth_routes)
        .fallback(system::not_found)
        .layer(from_fn_with_state(
            Gate::new(state.clone(), Access::Public),
            pipeline::admit,
        ))
        .nest("/api/users", api::users_router(&state));

    let app = if state.config.tls_enabled() {
        base_router.layer(from_fn(middleware::security_headers::security_headers_with_hsts))
    } else {
        base_router.layer(from_fn(middleware::security_headers::security_headers))
    };

    Ok(app
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
