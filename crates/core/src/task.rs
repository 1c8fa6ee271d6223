//! Task validation and the completion review workflow.
//!
//! Completion is a two-step handshake: the assignee requests it (the task
//! moves to `In Review`), then the task's creator confirms (`Done`) or
//! rejects (`Blocked`).

use crate::error::CoreError;
use crate::status::TaskStatus;
use crate::types::DbId;

pub const MAX_TASK_NAME_LEN: usize = 200;

pub fn validate_task_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Task name is required".into()));
    }
    if trimmed.chars().count() > MAX_TASK_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Task name must be at most {MAX_TASK_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_hours(hours: f64) -> Result<(), CoreError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(CoreError::Validation(
            "Hours must be a non-negative number".into(),
        ));
    }
    Ok(())
}

/// Validate a completion request and return the status the task moves to.
pub fn request_completion(
    status: TaskStatus,
    actor_id: DbId,
    assignee_id: Option<DbId>,
) -> Result<TaskStatus, CoreError> {
    if assignee_id != Some(actor_id) {
        return Err(CoreError::Forbidden(
            "Only the assignee can request completion of this task".into(),
        ));
    }
    match status {
        TaskStatus::Done => Err(CoreError::Validation("Task is already done".into())),
        TaskStatus::InReview => Err(CoreError::Validation(
            "Completion has already been requested for this task".into(),
        )),
        _ => Ok(TaskStatus::InReview),
    }
}

/// Validate a completion review and return the resulting status.
///
/// `confirm = true` finishes the task, `false` blocks it.
pub fn review_completion(
    status: TaskStatus,
    actor_id: DbId,
    creator_id: DbId,
    confirm: bool,
) -> Result<TaskStatus, CoreError> {
    if actor_id != creator_id {
        return Err(CoreError::Forbidden(
            "Only the task creator can confirm completion".into(),
        ));
    }
    if status != TaskStatus::InReview {
        return Err(CoreError::Validation(format!(
            "Task must be 'In Review' to confirm completion, current status is '{status}'"
        )));
    }
    Ok(if confirm {
        TaskStatus::Done
    } else {
        TaskStatus::Blocked
    })
}
