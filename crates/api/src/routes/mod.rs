pub mod auth;
pub mod comment;
pub mod health;
pub mod notification;
pub mod project;
pub mod task;
pub mod upload;
pub mod user;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                   WebSocket gateway (token auth)
///
/// /auth/register                        register (public)
/// /auth/login                           login (public)
/// /auth/refresh                         refresh (public)
/// /auth/profile                         get, update
///
/// /users                                list (admin, project manager)
/// /users/by-email                       lookup by email
/// /users/{id}                           get, update
/// /users/{id}/deactivate                deactivate (admin)
/// /users/{id}/activate                  activate (admin)
/// /users/{id}/change-password           change password (self)
/// /users/{id}/projects                  projects of a user
///
/// /projects                             list, create
/// /projects/{id}                        get, update, archive
/// /projects/{id}/members                add member
/// /projects/{id}/members/{user_id}      remove member
///
/// /tasks                                create
/// /tasks/my                             caller's assigned tasks
/// /tasks/project/{project_id}           list for a project
/// /tasks/{id}                           get, update, delete
/// /tasks/{id}/assign                    assign
/// /tasks/{id}/unassign                  unassign
/// /tasks/{id}/request-complete          assignee requests completion
/// /tasks/{id}/confirm-complete          creator confirms or rejects
///
/// /comments                             list (by entity), create
/// /comments/{id}                        update, delete
///
/// /notifications                        list
/// /notifications/unread-count           unread count
/// /notifications/mark-all-read          mark all read
/// /notifications/{id}/read              mark one read
/// /notifications/{id}                   delete
///
/// /upload/avatar                        avatar upload
/// /upload/file                          attachment upload
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket gateway.
        .route("/ws", get(ws::ws_handler))
        // Authentication and the caller's profile.
        .nest("/auth", auth::router())
        // User directory and administration.
        .nest("/users", user::router())
        // Projects and membership.
        .nest("/projects", project::router())
        // Tasks and the completion workflow.
        .nest("/tasks", task::router())
        // Comments on projects and tasks.
        .nest("/comments", comment::router())
        // The caller's notifications.
        .nest("/notifications", notification::router())
        // Multipart uploads.
        .nest("/upload", upload::router())
}
