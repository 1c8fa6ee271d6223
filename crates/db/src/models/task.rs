//! Task entity model and DTOs.

use projecthub_core::realtime::TaskSummary;
use projecthub_core::status::{Priority, TaskStatus};
use projecthub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A task row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<Timestamp>,
    pub status: String,
    pub priority: String,
    pub assigned_to_id: Option<DbId>,
    pub created_by_id: DbId,
    pub hours: f64,
    pub attachments: Option<String>,
    pub completion_requested_at: Option<Timestamp>,
    pub reminder_sent_at: Option<Timestamp>,
    pub overdue_notified_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// Parsed status. Rows are guarded by a CHECK constraint, so an unknown
    /// value only appears if the schema and code disagree.
    pub fn task_status(&self) -> TaskStatus {
        TaskStatus::parse(&self.status).unwrap_or_default()
    }

    /// Live-event payload for this task.
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            project_id: self.project_id,
            name: self.name.clone(),
            status: self.task_status(),
            priority: Priority::parse(&self.priority).unwrap_or_default(),
            due_date: self.due_date,
            assigned_to_id: self.assigned_to_id,
            created_by_id: self.created_by_id,
        }
    }
}

/// DTO for creating a new task. The creator is the authenticated user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTask {
    pub project_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<Timestamp>,
    /// Defaults to `To Do` if omitted.
    pub status: Option<String>,
    /// Defaults to `Medium` if omitted.
    pub priority: Option<String>,
    pub assigned_to_id: Option<DbId>,
    pub hours: Option<f64>,
    pub attachments: Option<String>,
}

/// DTO for updating an existing task. All fields are optional.
///
/// Assignment changes go through the dedicated assign/unassign endpoints
/// when the assignee should be cleared; here `assigned_to_id` can only set one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Timestamp>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to_id: Option<DbId>,
    pub hours: Option<f64>,
    pub attachments: Option<String>,
}

/// Filters for a project's task list.
#[derive(Debug, Default)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to_id: Option<DbId>,
}

/// A task due for a reminder, joined with its assignee's contact details.
#[derive(Debug, Clone, FromRow)]
pub struct ReminderCandidate {
    pub task_id: DbId,
    pub task_name: String,
    pub project_id: DbId,
    pub due_date: Timestamp,
    pub assignee_id: DbId,
    pub assignee_email: String,
    pub assignee_name: String,
}
