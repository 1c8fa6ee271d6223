//! Handlers for the `/projects` resource, including membership.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use projecthub_core::error::CoreError;
use projecthub_core::notification;
use projecthub_core::pagination::PageRequest;
use projecthub_core::permissions::ProjectAction;
use projecthub_core::project::{
    validate_budget, validate_date_range, validate_progress, validate_project_name,
};
use projecthub_core::realtime::Room;
use projecthub_core::status::{Priority, ProjectStatus};
use projecthub_core::types::DbId;
use projecthub_db::models::project::{
    CreateProject, Project, ProjectDetail, ProjectFilter, UpdateProject,
};
use projecthub_db::repositories::{ProjectRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::access::require_project;
use crate::middleware::auth::AuthUser;
use crate::notifications::Broadcaster;
use crate::response::{DataResponse, Page};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /projects`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Request body for `POST /projects/{id}/members`.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/projects
///
/// Admins see every project; everyone else sees the projects they own or
/// belong to. Archived projects are never listed.
pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ProjectListQuery>,
) -> AppResult<Json<DataResponse<Page<Project>>>> {
    let page = PageRequest::new(params.page, params.limit);

    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        status.parse::<ProjectStatus>()?;
    }

    let filter = ProjectFilter {
        status: params.status.filter(|s| !s.is_empty()),
        search: params.search.filter(|s| !s.trim().is_empty()),
        visible_to: (!auth.is_admin()).then_some(auth.user_id),
    };

    let projects = ProjectRepo::list(&state.pool, &filter, page.limit, page.offset()).await?;
    let total = ProjectRepo::count(&state.pool, &filter).await?;

    Ok(Json(DataResponse {
        data: Page::new(projects, total, page),
    }))
}

/// POST /api/projects
///
/// The caller becomes the owner. Initial members are notified and, if
/// connected, subscribed to the project's room.
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectDetail>>)> {
    validate_project_name(&input.name)?;
    validate_fields(
        input.status.as_deref(),
        input.priority.as_deref(),
        input.progress,
        input.budget,
    )?;
    validate_date_range(input.start_date, input.end_date)?;
    input.name = input.name.trim().to_string();

    input.members.retain(|id| *id != auth.user_id);
    input.members.sort_unstable();
    input.members.dedup();
    for member_id in &input.members {
        if UserRepo::find_by_id(&state.pool, *member_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("User {member_id} not found")));
        }
    }

    let project = ProjectRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(
        project_id = project.id,
        owner_id = auth.user_id,
        members = input.members.len(),
        "Project created"
    );

    let room = Room::Project(project.id);
    state.ws_manager.join_user_to_room(auth.user_id, room).await;
    for member_id in &input.members {
        state.ws_manager.join_user_to_room(*member_id, room).await;
    }

    let draft = notification::added_to_new_project(project.id, &project.name);
    Broadcaster::from_state(&state)
        .notify(&input.members, Some(auth.user_id), &draft)
        .await;

    let detail = project_detail(&state, project).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let ctx = require_project(&state, &auth, id, ProjectAction::View).await?;
    let detail = project_detail(&state, ctx.project).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/projects/{id}
///
/// Admin or owner only.
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let ctx = require_project(&state, &auth, id, ProjectAction::Update).await?;

    if let Some(name) = input.name.as_deref() {
        validate_project_name(name)?;
    }
    input.name = input.name.map(|n| n.trim().to_string());
    validate_fields(
        input.status.as_deref(),
        input.priority.as_deref(),
        input.progress,
        input.budget,
    )?;
    validate_date_range(
        input.start_date.or(ctx.project.start_date),
        input.end_date.or(ctx.project.end_date),
    )?;

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    tracing::info!(project_id = id, updated_by = auth.user_id, "Project updated");

    let detail = project_detail(&state, project).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /api/projects/{id}
///
/// Archives the project. Allowed for admins and for project managers who
/// own it.
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    require_project(&state, &auth, id, ProjectAction::Archive).await?;

    if !ProjectRepo::archive(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }));
    }

    tracing::info!(project_id = id, archived_by = auth.user_id, "Project archived");
    Ok(Json(MessageResponse {
        message: "Project archived successfully",
    }))
}

/// POST /api/projects/{id}/members
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectDetail>>)> {
    let ctx = require_project(&state, &auth, id, ProjectAction::ManageMembers).await?;

    if UserRepo::find_by_id(&state.pool, input.user_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: input.user_id,
        }));
    }

    let already_member = input.user_id == ctx.project.owner_id
        || ProjectRepo::is_member(&state.pool, id, input.user_id).await?;
    if already_member || !ProjectRepo::add_member(&state.pool, id, input.user_id).await? {
        return Err(AppError::BadRequest(
            "User is already a member of this project".into(),
        ));
    }

    tracing::info!(project_id = id, user_id = input.user_id, added_by = auth.user_id, "Member added");

    let joined = state
        .ws_manager
        .join_user_to_room(input.user_id, Room::Project(id))
        .await;
    tracing::debug!(project_id = id, user_id = input.user_id, connections = joined, "Subscribed member to project room");

    if state.config.notify_member_added {
        let draft = notification::added_to_project(id, &ctx.project.name);
        Broadcaster::from_state(&state)
            .notify(&[input.user_id], Some(auth.user_id), &draft)
            .await;
    }

    let detail = project_detail(&state, ctx.project).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// DELETE /api/projects/{id}/members/{user_id}
///
/// The owner cannot be removed.
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let ctx = require_project(&state, &auth, id, ProjectAction::ManageMembers).await?;

    if user_id == ctx.project.owner_id {
        return Err(AppError::BadRequest(
            "Cannot remove the project owner".into(),
        ));
    }

    if !ProjectRepo::remove_member(&state.pool, id, user_id).await? {
        return Err(AppError::NotFound(
            "User is not a member of this project".into(),
        ));
    }

    tracing::info!(project_id = id, user_id, removed_by = auth.user_id, "Member removed");

    state
        .ws_manager
        .leave_user_from_room(user_id, Room::Project(id))
        .await;

    let detail = project_detail(&state, ctx.project).await?;
    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_fields(
    status: Option<&str>,
    priority: Option<&str>,
    progress: Option<i32>,
    budget: Option<f64>,
) -> Result<(), CoreError> {
    if let Some(status) = status {
        status.parse::<ProjectStatus>()?;
    }
    if let Some(priority) = priority {
        priority.parse::<Priority>()?;
    }
    if let Some(progress) = progress {
        validate_progress(progress)?;
    }
    if let Some(budget) = budget {
        validate_budget(budget)?;
    }
    Ok(())
}

/// Resolve the owner and members of a project.
async fn project_detail(state: &AppState, project: Project) -> AppResult<ProjectDetail> {
    let owner = ProjectRepo::owner(&state.pool, project.id).await?;
    let members = ProjectRepo::members(&state.pool, project.id).await?;
    Ok(ProjectDetail {
        project,
        owner,
        members,
    })
}

