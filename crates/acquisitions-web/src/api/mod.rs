pub mod auth_handlers;
pub mod system;
pub mod users;

use acquisitions_core::Role;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::pipeline::{self, Access, Gate, Guard};
use crate::state::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth_handlers::sign_up))
        .route("/sign-in", post(auth_handlers::sign_in))
        .route("/sign-out", post(auth_handlers::sign_out))
}

/// `/api/users`. Every request, matched or not, is authenticated first.
pub fn users_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(users::list_users)
                .route_layer(from_fn_with_state(Guard::Role(Role::Admin), pipeline::guard)),
        )
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user)
                .route_layer(from_fn_with_state(
                    Guard::AnyRole(&[Role::User, Role::Admin]),
                    pipeline::guard,
                )),
        )
        .fallback(system::not_found)
        .layer(from_fn_with_state(
            Gate::new(state.clone(), Access::Authenticated),
            pipeline::admit,
        ))
}
