//! Route definitions for the `/upload` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::upload;
use crate::state::AppState;

/// Routes mounted at `/upload`.
///
/// ```text
/// POST /avatar  -> upload_avatar (multipart field `avatar`)
/// POST /file    -> upload_file (multipart fields `file`, `category`)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/avatar", post(upload::upload_avatar))
        .route("/file", post(upload::upload_file))
}
