//! Route definitions for the `/comments` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::comment;
use crate::state::AppState;

/// Routes mounted at `/comments`.
///
/// ```text
/// GET    /?entity_type=&entity_id=  -> list_comments
/// POST   /                          -> create_comment
/// PUT    /{id}                      -> update_comment (author)
/// DELETE /{id}                      -> delete_comment (author or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(comment::list_comments).post(comment::create_comment))
        .route(
            "/{id}",
            put(comment::update_comment).delete(comment::delete_comment),
        )
}
