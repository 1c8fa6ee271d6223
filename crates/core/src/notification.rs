//! Notification kinds and the drafts the broadcaster turns into rows.
//!
//! Builders in this module own every user-facing notification text so the
//! REST handlers, the gateway and the reminder scheduler agree on wording.

use serde::{Deserialize, Serialize};

use crate::status::{CommentTarget, RelatedEntityType};
use crate::types::DbId;

/// Maximum stored title length (characters).
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum stored message length (characters).
pub const MAX_MESSAGE_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TaskAssigned,
    TaskUpdated,
    TaskCompleted,
    ProjectUpdated,
    CommentAdded,
    DueDateReminder,
    MessageReceived,
}

impl NotificationType {
    pub const ALL: &'static [NotificationType] = &[
        NotificationType::TaskAssigned,
        NotificationType::TaskUpdated,
        NotificationType::TaskCompleted,
        NotificationType::ProjectUpdated,
        NotificationType::CommentAdded,
        NotificationType::DueDateReminder,
        NotificationType::MessageReceived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::TaskAssigned => "task_assigned",
            NotificationType::TaskUpdated => "task_updated",
            NotificationType::TaskCompleted => "task_completed",
            NotificationType::ProjectUpdated => "project_updated",
            NotificationType::CommentAdded => "comment_added",
            NotificationType::DueDateReminder => "due_date_reminder",
            NotificationType::MessageReceived => "message_received",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a notification links back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedEntity {
    pub entity_type: RelatedEntityType,
    pub entity_id: DbId,
}

impl RelatedEntity {
    pub fn project(id: DbId) -> Self {
        Self {
            entity_type: RelatedEntityType::Project,
            entity_id: id,
        }
    }

    pub fn task(id: DbId) -> Self {
        Self {
            entity_type: RelatedEntityType::Task,
            entity_id: id,
        }
    }

    pub fn comment(id: DbId) -> Self {
        Self {
            entity_type: RelatedEntityType::Comment,
            entity_id: id,
        }
    }

    pub fn user(id: DbId) -> Self {
        Self {
            entity_type: RelatedEntityType::User,
            entity_id: id,
        }
    }
}

/// A notification ready to be written for one or more recipients.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related: Option<RelatedEntity>,
}

impl NotificationDraft {
    /// Build a draft, truncating title and message to their stored limits.
    pub fn new(
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        related: Option<RelatedEntity>,
    ) -> Self {
        Self {
            kind,
            title: truncate_chars(title.into(), MAX_TITLE_LEN),
            message: truncate_chars(message.into(), MAX_MESSAGE_LEN),
            related,
        }
    }
}

fn truncate_chars(mut value: String, max: usize) -> String {
    if let Some((idx, _)) = value.char_indices().nth(max) {
        value.truncate(idx);
    }
    value
}

pub fn comment_added(
    author_name: &str,
    target: CommentTarget,
    target_name: &str,
    comment_id: DbId,
) -> NotificationDraft {
    let noun = match target {
        CommentTarget::Project => "project",
        CommentTarget::Task => "task",
    };
    NotificationDraft::new(
        NotificationType::CommentAdded,
        "New Comment",
        format!("{author_name} commented on {noun}: {target_name}"),
        Some(RelatedEntity::comment(comment_id)),
    )
}

pub fn task_assigned(task_id: DbId, task_name: &str, project_name: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::TaskAssigned,
        "New Task Assigned",
        format!("You have been assigned to task: {task_name} in project {project_name}"),
        Some(RelatedEntity::task(task_id)),
    )
}

pub fn task_updated(task_id: DbId, task_name: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::TaskUpdated,
        "Task Updated",
        format!("Task \"{task_name}\" has been updated"),
        Some(RelatedEntity::task(task_id)),
    )
}

pub fn completion_requested(
    task_id: DbId,
    task_name: &str,
    requester_name: &str,
) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::TaskUpdated,
        "Task Completion Requested",
        format!("{requester_name} has requested completion of task \"{task_name}\""),
        Some(RelatedEntity::task(task_id)),
    )
}

pub fn completion_confirmed(task_id: DbId, task_name: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::TaskCompleted,
        "Task Completed",
        format!("Your completion of task \"{task_name}\" has been confirmed"),
        Some(RelatedEntity::task(task_id)),
    )
}

pub fn completion_rejected(task_id: DbId, task_name: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::TaskUpdated,
        "Task Completion Rejected",
        format!("Completion of task \"{task_name}\" was rejected and the task is now blocked"),
        Some(RelatedEntity::task(task_id)),
    )
}

pub fn added_to_new_project(project_id: DbId, project_name: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::ProjectUpdated,
        "Added to New Project",
        format!("You have been added to project: {project_name}"),
        Some(RelatedEntity::project(project_id)),
    )
}

pub fn added_to_project(project_id: DbId, project_name: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::ProjectUpdated,
        "Added to Project",
        format!("You have been added to project: {project_name}"),
        Some(RelatedEntity::project(project_id)),
    )
}

pub fn direct_message(sender_id: DbId, sender_name: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::MessageReceived,
        "New Message",
        format!("{sender_name} sent you a message"),
        Some(RelatedEntity::user(sender_id)),
    )
}

/// `due_date` is pre-formatted by the caller (e.g. `2026-03-14`).
pub fn task_due_soon(task_id: DbId, task_name: &str, due_date: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::DueDateReminder,
        "Task Due Soon",
        format!("Task \"{task_name}\" is due on {due_date}"),
        Some(RelatedEntity::task(task_id)),
    )
}

pub fn task_overdue(task_id: DbId, task_name: &str, due_date: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationType::DueDateReminder,
        "Task Overdue",
        format!("Task \"{task_name}\" was due on {due_date} and is now overdue"),
        Some(RelatedEntity::task(task_id)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_round_trips_through_text() {
        for kind in NotificationType::ALL {
            assert_eq!(NotificationType::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(NotificationType::parse("TaskAssigned"), None);
    }

    #[test]
    fn test_serde_matches_stored_text() {
        let json = serde_json::to_string(&NotificationType::DueDateReminder).unwrap();
        assert_eq!(json, "\"due_date_reminder\"");
    }

    #[test]
    fn test_draft_truncates_long_text() {
        let draft = NotificationDraft::new(
            NotificationType::TaskUpdated,
            "é".repeat(250),
            "m".repeat(600),
            None,
        );
        assert_eq!(draft.title.chars().count(), MAX_TITLE_LEN);
        assert_eq!(draft.message.chars().count(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn test_direct_message_wording() {
        let draft = direct_message(3, "Ada Lovelace");
        assert_eq!(draft.kind, NotificationType::MessageReceived);
        assert_eq!(draft.title, "New Message");
        assert_eq!(draft.message, "Ada Lovelace sent you a message");
        assert_eq!(draft.related, Some(RelatedEntity::user(3)));
    }

    #[test]
    fn test_comment_added_points_at_comment() {
        let draft = comment_added("Bob", CommentTarget::Task, "Fix login", 42);
        assert_eq!(draft.kind, NotificationType::CommentAdded);
        assert_eq!(draft.message, "Bob commented on task: Fix login");
        assert_eq!(draft.related, Some(RelatedEntity::comment(42)));
    }

    #[test]
    fn test_completion_kinds() {
        assert_eq!(
            completion_confirmed(1, "t").kind,
            NotificationType::TaskCompleted
        );
        assert_eq!(
            completion_rejected(1, "t").kind,
            NotificationType::TaskUpdated
        );
        assert_eq!(
            completion_requested(1, "t", "A").kind,
            NotificationType::TaskUpdated
        );
    }

    #[test]
    fn test_reminder_wording() {
        assert_eq!(
            task_due_soon(1, "Ship", "2026-03-14").message,
            "Task \"Ship\" is due on 2026-03-14"
        );
        assert_eq!(
            task_overdue(1, "Ship", "2026-03-14").message,
            "Task \"Ship\" was due on 2026-03-14 and is now overdue"
        );
    }
}
