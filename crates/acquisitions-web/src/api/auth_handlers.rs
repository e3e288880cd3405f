use acquisitions_core::{Identity, NewUser, Role};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;

use crate::auth::cookies::{removal_cookie, session_cookie};
use crate::auth::middleware::extract_token;
use crate::auth::{jwt, password};
use crate::dto::*;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation;

/// Turns a malformed JSON body into a validation error instead of axum's
/// plain-text rejection.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(vec![format!("body: {}", rejection.body_text())]))
}

fn issue_session(state: &AppState, jar: CookieJar, identity: &Identity) -> Result<CookieJar, AppError> {
    let (token, _expires_at) = jwt::create_token(
        &state.config.auth.jwt_secret,
        state.config.auth.jwt_ttl_hours,
        identity,
    )?;
    let cookie = session_cookie(&state.config.auth.cookie_name, token, state.config.is_production());
    Ok(jar.add(cookie))
}

pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let valid = validation::sign_up(json_body(body)?)?;

    if state.users.find_credentials(&valid.email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password_blocking(valid.password).await?;
    let user = state
        .users
        .create_user(NewUser {
            name: valid.name,
            email: valid.email,
            password_hash,
            role: Role::User,
        })
        .await?;

    let jar = issue_session(&state, jar, &user)?;
    tracing::info!("User registered successfully: {} (id {})", user.email, user.id);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered",
            user: user.into(),
        }),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let valid = validation::sign_in(json_body(body)?)?;

    let Some((user, hash)) = state.users.find_credentials(&valid.email).await? else {
        tracing::warn!("Failed sign-in attempt for unknown email: {}", valid.email);
        return Err(AppError::Auth("Invalid credentials".to_string()));
    };

    if !password::verify_password_blocking(hash, valid.password).await? {
        tracing::warn!("Failed sign-in attempt for user: {}", user.email);
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    let jar = issue_session(&state, jar, &user)?;
    tracing::info!("User signed in successfully: {}", user.email);

    Ok((
        jar,
        Json(AuthResponse {
            message: "User signed in successfully",
            user: user.into(),
        }),
    ))
}

pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Some(token) = extract_token(&headers, &state.config.auth.cookie_name) {
        if let Ok(claims) = jwt::verify_token(&state.config.auth.jwt_secret, &token) {
            state.revoke_token(claims.jti.clone(), claims.exp);
            tracing::info!("Token revoked for user: {} (jti: {})", claims.sub, claims.jti);
        }
    }

    (
        jar.remove(removal_cookie(&state.config.auth.cookie_name)),
        Json(MessageResponse {
            message: "User signed out successfully",
        }),
    )
}
