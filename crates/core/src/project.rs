//! Project field validation.

use crate::error::CoreError;
use crate::types::Timestamp;

pub const MAX_PROJECT_NAME_LEN: usize = 100;

pub fn validate_project_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Project name is required".into()));
    }
    if trimmed.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Project name must be at most {MAX_PROJECT_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Progress is a whole percentage.
pub fn validate_progress(progress: i32) -> Result<(), CoreError> {
    if !(0..=100).contains(&progress) {
        return Err(CoreError::Validation(format!(
            "Progress must be between 0 and 100, got {progress}"
        )));
    }
    Ok(())
}

pub fn validate_budget(budget: f64) -> Result<(), CoreError> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(CoreError::Validation(
            "Budget must be a non-negative number".into(),
        ));
    }
    Ok(())
}

pub fn validate_date_range(
    start_date: Option<Timestamp>,
    end_date: Option<Timestamp>,
) -> Result<(), CoreError> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            return Err(CoreError::Validation(
                "End date must not be before start date".into(),
            ));
        }
    }
    Ok(())
}
