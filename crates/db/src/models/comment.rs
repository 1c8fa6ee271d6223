//! Comment entity model and DTOs.

use projecthub_core::realtime::{CommentSummary, UserSummary};
use projecthub_core::status::CommentTarget;
use projecthub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A comment row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub user_id: DbId,
    pub content: String,
    pub parent_id: Option<DbId>,
    pub attachments: serde_json::Value,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A comment joined with its author, as returned by the API.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CommentView {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub user_id: DbId,
    pub content: String,
    pub parent_id: Option<DbId>,
    pub attachments: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub author_username: String,
    pub author_full_name: String,
    pub author_avatar: Option<String>,
}

impl CommentView {
    /// Live-event payload for this comment.
    pub fn summary(&self) -> CommentSummary {
        CommentSummary {
            id: self.id,
            entity_type: CommentTarget::parse(&self.entity_type).unwrap_or(CommentTarget::Project),
            entity_id: self.entity_id,
            content: self.content.clone(),
            parent_id: self.parent_id,
            author: UserSummary {
                id: self.user_id,
                username: self.author_username.clone(),
                full_name: self.author_full_name.clone(),
            },
            created_at: self.created_at,
        }
    }
}

/// A top-level comment with its replies (oldest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

/// DTO for creating a comment. The author is the authenticated user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub entity_type: String,
    pub entity_id: DbId,
    pub content: String,
    pub parent_id: Option<DbId>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// DTO for editing a comment's text.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateComment {
    pub content: String,
}
