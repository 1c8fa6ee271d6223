//! Real-time gateway rooms and wire protocol.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": {...}}`. [`ClientEvent`] is what browsers
//! send, [`ServerEvent`] is everything the server pushes. Both are closed
//! unions: an unknown event name is a decode error, reported back to the
//! sender as an `error` event.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::notification::NotificationType;
use crate::status::{CommentTarget, Priority, RelatedEntityType, TaskStatus};
use crate::types::{DbId, Timestamp};

/// A broadcast scope. Displayed as `user_{id}` / `project_{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(DbId),
    Project(DbId),
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::User(id) => write!(f, "user_{id}"),
            Room::Project(id) => write!(f, "project_{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserSummary {
    pub id: DbId,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LiveNotification {
    pub id: DbId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub related_entity_type: Option<RelatedEntityType>,
    pub related_entity_id: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommentSummary {
    pub id: DbId,
    pub entity_type: CommentTarget,
    pub entity_id: DbId,
    pub content: String,
    pub parent_id: Option<DbId>,
    pub author: UserSummary,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaskSummary {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<Timestamp>,
    pub assigned_to_id: Option<DbId>,
    pub created_by_id: DbId,
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data")]
#[ts(export)]
pub enum ClientEvent {
    #[serde(rename = "project:join")]
    ProjectJoin { project_id: DbId },

    #[serde(rename = "project:leave")]
    ProjectLeave { project_id: DbId },

    /// Free-form presence string ("online", "away", ...).
    #[serde(rename = "user:status")]
    UserStatus { status: String },

    #[serde(rename = "task:status_update")]
    TaskStatusUpdate {
        task_id: DbId,
        project_id: DbId,
        old_status: TaskStatus,
        new_status: TaskStatus,
    },

    #[serde(rename = "comment:typing")]
    CommentTyping {
        entity_type: CommentTarget,
        entity_id: DbId,
    },

    #[serde(rename = "comment:stop_typing")]
    CommentStopTyping {
        entity_type: CommentTarget,
        entity_id: DbId,
    },

    /// `recipient_id` is validated by the gateway, see [`parse_recipient_id`].
    #[serde(rename = "message:private")]
    PrivateMessage {
        #[ts(type = "number | string")]
        recipient_id: serde_json::Value,
        message: String,
    },
}

impl ClientEvent {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Accept a positive integer id, either as a JSON number or a numeric string.
pub fn parse_recipient_id(value: &serde_json::Value) -> Option<DbId> {
    let id = match value {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse::<DbId>().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data")]
#[ts(export)]
pub enum ServerEvent {
    #[serde(rename = "notifications:count")]
    NotificationsCount { count: i64 },

    #[serde(rename = "notification:new")]
    NotificationNew { notification: LiveNotification },

    #[serde(rename = "project:user_joined")]
    ProjectUserJoined { user: UserSummary, message: String },

    #[serde(rename = "project:user_left")]
    ProjectUserLeft { user: UserSummary, message: String },

    #[serde(rename = "user:status_changed")]
    UserStatusChanged {
        user_id: DbId,
        username: String,
        status: String,
    },

    #[serde(rename = "user:offline")]
    UserOffline {
        user_id: DbId,
        username: String,
        timestamp: Timestamp,
    },

    #[serde(rename = "task:status_updated")]
    TaskStatusUpdated {
        task_id: DbId,
        old_status: TaskStatus,
        new_status: TaskStatus,
        /// Full name of the user who changed the status.
        updated_by: String,
        timestamp: Timestamp,
    },

    #[serde(rename = "task:assigned")]
    TaskAssigned { task: TaskSummary },

    #[serde(rename = "task:updated")]
    TaskUpdated { task: TaskSummary },

    #[serde(rename = "comment:created")]
    CommentCreated { comment: CommentSummary },

    #[serde(rename = "comment:user_typing")]
    CommentUserTyping {
        entity_type: CommentTarget,
        entity_id: DbId,
        user: UserSummary,
    },

    #[serde(rename = "comment:user_stop_typing")]
    CommentUserStopTyping {
        entity_type: CommentTarget,
        entity_id: DbId,
        user_id: DbId,
    },

    #[serde(rename = "message:received")]
    MessageReceived {
        from: UserSummary,
        message: String,
        timestamp: Timestamp,
    },

    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    pub fn user_joined(user: UserSummary) -> Self {
        let message = format!("{} joined the project", user.full_name);
        ServerEvent::ProjectUserJoined { user, message }
    }

    pub fn user_left(user: UserSummary) -> Self {
        let message = format!("{} left the project", user.full_name);
        ServerEvent::ProjectUserLeft { user, message }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::NotificationsCount { .. } => "notifications:count",
            ServerEvent::NotificationNew { .. } => "notification:new",
            ServerEvent::ProjectUserJoined { .. } => "project:user_joined",
            ServerEvent::ProjectUserLeft { .. } => "project:user_left",
            ServerEvent::UserStatusChanged { .. } => "user:status_changed",
            ServerEvent::UserOffline { .. } => "user:offline",
            ServerEvent::TaskStatusUpdated { .. } => "task:status_updated",
            ServerEvent::TaskAssigned { .. } => "task:assigned",
            ServerEvent::TaskUpdated { .. } => "task:updated",
            ServerEvent::CommentCreated { .. } => "comment:created",
            ServerEvent::CommentUserTyping { .. } => "comment:user_typing",
            ServerEvent::CommentUserStopTyping { .. } => "comment:user_stop_typing",
            ServerEvent::MessageReceived { .. } => "message:received",
            ServerEvent::Error { .. } => "error",
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
