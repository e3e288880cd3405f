use acquisitions_core::{AuthFailure, CoreError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    /// Rejected by the authentication stage.
    Unauthenticated(AuthFailure),
    /// Sign-in with an unknown email or a wrong password.
    Auth(String),
    Forbidden(String),
    /// A well-formed request the current state does not allow.
    InvalidOperation(String),
    Validation(Vec<String>),
    NotFound(String),
    Conflict(String),
    RateLimited,
    Shielded,
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl ErrorBody {
    fn message(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: Some(message.into()),
            details: None,
        }
    }

    fn labelled(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: Some(error),
            message: Some(message.into()),
            details: None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) | AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::Shielded => StatusCode::FORBIDDEN,
            AppError::InvalidOperation(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Unauthenticated(reason) => ErrorBody::message(reason.message()),
            AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::InvalidOperation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => ErrorBody::message(msg),
            AppError::Validation(details) => ErrorBody {
                error: Some("Validation error"),
                message: None,
                details: Some(details),
            },
            AppError::RateLimited => ErrorBody::labelled(
                "Rate limit exceeded",
                "Too many requests. Please try again later.",
            ),
            AppError::Shielded => {
                ErrorBody::labelled("Access denied", "Request blocked by security policy.")
            }
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                ErrorBody::message("Internal Server Error")
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Unauthenticated(reason) => AppError::Unauthenticated(reason),
            CoreError::Forbidden(msg) => AppError::Forbidden(msg),
            CoreError::InvalidOperation(msg) => AppError::InvalidOperation(msg),
            CoreError::UserNotFound(_) => AppError::NotFound("User not found".to_string()),
            CoreError::EmailTaken(_) => AppError::Conflict("Email already exists".to_string()),
            CoreError::Oracle(msg) => AppError::Internal(format!("rate limit oracle: {msg}")),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}

#[cfg(test)]
mod tests {
    use acquisitions_core::UserId;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    use super::*;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn auth_rejections_carry_only_a_message() {
        let (status, body) = render(AppError::Unauthenticated(AuthFailure::NoCredential)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "No access token provided" }));
    }

    #[tokio::test]
    async fn rate_limit_and_shield_are_distinguishable() {
        let (status, body) = render(AppError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Rate limit exceeded");

        let (status, body) = render(AppError::Shielded).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Request blocked by security policy.");
    }

    #[tokio::test]
    async fn validation_lists_details() {
        let (status, body) = render(AppError::Validation(vec!["id: bad".into()])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Validation error", "details": ["id: bad"] }));
    }

    #[tokio::test]
    async fn internal_errors_are_not_leaked() {
        let (status, body) = render(CoreError::Oracle("backend down".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Internal Server Error" }));
    }

    #[test]
    fn core_errors_map_to_statuses() {
        let cases = [
            (CoreError::UserNotFound(UserId::new(3)), StatusCode::NOT_FOUND),
            (CoreError::EmailTaken("a@b.io".into()), StatusCode::CONFLICT),
            (CoreError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (CoreError::InvalidOperation("no".into()), StatusCode::BAD_REQUEST),
        ];
        for (error, status) in cases {
            assert_eq!(AppError::from(error).status(), status);
        }
    }
}
