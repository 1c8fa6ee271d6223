//! Shared project lookups and capability checks.

use projecthub_core::error::CoreError;
use projecthub_core::permissions::{ProjectAccess, ProjectAction};
use projecthub_core::types::DbId;
use projecthub_db::models::project::Project;
use projecthub_db::repositories::ProjectRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// A non-archived project together with the caller's resolved access.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub project: Project,
    pub access: ProjectAccess,
}

/// Load a non-archived project or fail with 404.
pub async fn find_project(state: &AppState, project_id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))
}

/// Load a project and check that `auth` may perform `action` on it.
pub async fn require_project(
    state: &AppState,
    auth: &AuthUser,
    project_id: DbId,
    action: ProjectAction,
) -> AppResult<ProjectContext> {
    let project = find_project(state, project_id).await?;
    let access = check_access(state, auth, &project, action).await?;
    Ok(ProjectContext { project, access })
}

/// Check that `auth` may perform `action` on an already loaded project.
pub async fn check_access(
    state: &AppState,
    auth: &AuthUser,
    project: &Project,
    action: ProjectAction,
) -> AppResult<ProjectAccess> {
    let is_member = ProjectRepo::is_member(&state.pool, project.id, auth.user_id).await?;
    let access = ProjectAccess::resolve(auth.user_id, &auth.role, project.owner_id, is_member);
    access.require(action)?;
    Ok(access)
}

/// Check that `user_id` can be assigned work in `project` (owner or member).
pub async fn ensure_assignable(state: &AppState, project: &Project, user_id: DbId) -> AppResult<()> {
    if user_id == project.owner_id
        || ProjectRepo::is_member(&state.pool, project.id, user_id).await?
    {
        return Ok(());
    }
    Err(AppError::BadRequest(
        "Assignee must be a member of the project".into(),
    ))
}
