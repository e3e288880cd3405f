use acquisitions_core::{require_self_or_admin, restrict_self_update, OwnedAction, UserChanges};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::auth_handlers::json_body;
use crate::auth::middleware::CurrentUser;
use crate::auth::password;
use crate::dto::{UpdateUserRequest, UserListResponse, UserResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::validation;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>, AppError> {
    tracing::info!("Getting users...");
    let users = state.users.get_users().await?;

    Ok(Json(UserListResponse {
        message: "Successfully retrieved users",
        count: users.len(),
        users,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id = validation::user_id(&raw_id)?;
    let user = state.users.get_user_by_id(id).await?;

    Ok(Json(UserResponse {
        message: "User retrieved successfully",
        user,
    }))
}

pub async fn update_user(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let id = validation::user_id(&raw_id)?;
    let update = validation::update(json_body(body)?)?;

    require_self_or_admin(Some(&actor), id, OwnedAction::Update)?;
    let requested = UserChanges {
        name: update.name,
        email: update.email,
        password_hash: None,
        role: update.role,
    };
    let mut changes = restrict_self_update(&actor, id, requested)?;

    if let Some(plain) = update.password {
        changes.password_hash = Some(password::hash_password_blocking(plain).await?);
    }

    let user = state.users.update_user(id, changes).await?;
    tracing::info!("User {} updated by {}", user.id, actor.id);

    Ok(Json(UserResponse {
        message: "User updated successfully",
        user,
    }))
}

pub async fn delete_user(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id = validation::user_id(&raw_id)?;

    require_self_or_admin(Some(&actor), id, OwnedAction::Delete)?;
    // The store checks the last-admin rule under its write lock.
    let user = state.users.delete_user(&actor, id).await?;
    tracing::info!("User {} deleted by {}", user.id, actor.id);

    Ok(Json(UserResponse {
        message: "User deleted successfully",
        user,
    }))
}
