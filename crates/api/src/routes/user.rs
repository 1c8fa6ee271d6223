//! Route definitions for the `/users` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET  /                        -> list_users (admin, project manager)
/// GET  /by-email                -> get_user_by_email
/// GET  /{id}                    -> get_user
/// PUT  /{id}                    -> update_user (self or admin)
/// PUT  /{id}/deactivate         -> deactivate_user (admin)
/// PUT  /{id}/activate           -> activate_user (admin)
/// PUT  /{id}/change-password    -> change_password (self)
/// GET  /{id}/projects           -> get_user_projects (self or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(user::list_users))
        .route("/by-email", get(user::get_user_by_email))
        .route("/{id}", get(user::get_user).put(user::update_user))
        .route("/{id}/deactivate", put(user::deactivate_user))
        .route("/{id}/activate", put(user::activate_user))
        .route("/{id}/change-password", put(user::change_password))
        .route("/{id}/projects", get(user::get_user_projects))
}
