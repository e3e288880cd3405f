use acquisitions_core::{AuthFailure, CoreError, Identity, UserId};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::state::AppState;

/// The identity resolved by the authentication stage for this request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthenticated(AuthFailure::MissingIdentity))
    }
}

/// Reads the session credential. The cookie wins over the `Authorization` header.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

/// Resolves the caller's identity from the request credential.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, AppError> {
    let token = extract_token(headers, &state.config.auth.cookie_name)
        .ok_or(AppError::Unauthenticated(AuthFailure::NoCredential))?;

    let claims = super::jwt::verify_token(&state.config.auth.jwt_secret, &token)
        .map_err(|_| AppError::Unauthenticated(AuthFailure::InvalidOrExpired))?;

    if state.is_revoked(&claims.jti) {
        return Err(AppError::Unauthenticated(AuthFailure::InvalidOrExpired));
    }

    let id: UserId = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthenticated(AuthFailure::InvalidOrExpired))?;

    match state.users.get_user_by_id(id).await {
        Ok(identity) => Ok(identity),
        Err(CoreError::UserNotFound(_)) => {
            Err(AppError::Unauthenticated(AuthFailure::UserNotFound))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_header_is_read() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc.def")]);
        assert_eq!(extract_token(&h, "token").as_deref(), Some("abc.def"));
    }

    #[test]
    fn cookie_takes_precedence() {
        let h = headers(&[
            (header::COOKIE, "theme=dark; token=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(extract_token(&h, "token").as_deref(), Some("from-cookie"));
    }

    #[test]
    fn empty_cookie_falls_back_to_header() {
        let h = headers(&[
            (header::COOKIE, "token="),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(extract_token(&h, "token").as_deref(), Some("from-header"));
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_token(&h, "token"), None);
        assert_eq!(extract_token(&HeaderMap::new(), "token"), None);
    }
}
