//! Notification entity model and DTOs.

use projecthub_core::notification::{NotificationDraft, NotificationType};
use projecthub_core::realtime::LiveNotification;
use projecthub_core::status::RelatedEntityType;
use projecthub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl Notification {
    /// Live-event payload, or `None` if the stored type is unknown.
    pub fn to_live(&self) -> Option<LiveNotification> {
        Some(LiveNotification {
            id: self.id,
            kind: NotificationType::parse(&self.kind)?,
            title: self.title.clone(),
            message: self.message.clone(),
            is_read: self.is_read,
            related_entity_type: self
                .related_entity_type
                .as_deref()
                .and_then(RelatedEntityType::parse),
            related_entity_id: self.related_entity_id,
            created_at: self.created_at,
        })
    }
}

/// DTO for inserting a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<DbId>,
}

impl CreateNotification {
    pub fn from_draft(user_id: DbId, draft: &NotificationDraft) -> Self {
        Self {
            user_id,
            kind: draft.kind.as_str().to_string(),
            title: draft.title.clone(),
            message: draft.message.clone(),
            related_entity_type: draft.related.map(|r| r.entity_type.as_str().to_string()),
            related_entity_id: draft.related.map(|r| r.entity_id),
        }
    }
}
