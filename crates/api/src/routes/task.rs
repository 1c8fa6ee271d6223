//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::task;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// POST   /                          -> create_task
/// GET    /my                        -> my_tasks
/// GET    /project/{project_id}      -> list_project_tasks
/// GET    /{id}                      -> get_task
/// PUT    /{id}                      -> update_task
/// DELETE /{id}                      -> delete_task
/// POST   /{id}/assign               -> assign_task
/// POST   /{id}/unassign             -> unassign_task
/// POST   /{id}/request-complete     -> request_complete
/// POST   /{id}/confirm-complete     -> confirm_complete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(task::create_task))
        .route("/my", get(task::my_tasks))
        .route("/project/{project_id}", get(task::list_project_tasks))
        .route(
            "/{id}",
            get(task::get_task)
                .put(task::update_task)
                .delete(task::delete_task),
        )
        .route("/{id}/assign", post(task::assign_task))
        .route("/{id}/unassign", post(task::unassign_task))
        .route("/{id}/request-complete", post(task::request_complete))
        .route("/{id}/confirm-complete", post(task::confirm_complete))
}
