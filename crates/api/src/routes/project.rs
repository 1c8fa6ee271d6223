//! Route definitions for the `/projects` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                          -> list_projects
/// POST   /                          -> create_project
/// GET    /{id}                      -> get_project
/// PUT    /{id}                      -> update_project
/// DELETE /{id}                      -> delete_project (archive)
/// POST   /{id}/members              -> add_member
/// DELETE /{id}/members/{user_id}    -> remove_member
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list_projects).post(project::create_project))
        .route(
            "/{id}",
            get(project::get_project)
                .put(project::update_project)
                .delete(project::delete_project),
        )
        .route("/{id}/members", post(project::add_member))
        .route("/{id}/members/{user_id}", delete(project::remove_member))
}
