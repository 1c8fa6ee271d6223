//! Project entity model and DTOs.

use projecthub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub status: String,
    pub priority: String,
    pub owner_id: DbId,
    pub progress: i32,
    pub budget: f64,
    pub is_archived: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A user as listed on a project (owner or member).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub avatar: Option<String>,
}

/// A project with its owner and member list resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<ProjectMember>,
    pub members: Vec<ProjectMember>,
}

/// DTO for creating a new project. The owner is the authenticated user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    /// Defaults to `Not Started` if omitted.
    pub status: Option<String>,
    /// Defaults to `Medium` if omitted.
    pub priority: Option<String>,
    pub progress: Option<i32>,
    pub budget: Option<f64>,
    /// Initial members besides the owner.
    #[serde(default)]
    pub members: Vec<DbId>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub progress: Option<i32>,
    pub budget: Option<f64>,
}

/// Filters for project listings. Archived projects are always excluded.
#[derive(Debug, Default)]
pub struct ProjectFilter {
    pub status: Option<String>,
    /// Case-insensitive match against name and description.
    pub search: Option<String>,
    /// Restrict to projects this user owns or is a member of.
    pub visible_to: Option<DbId>,
}
