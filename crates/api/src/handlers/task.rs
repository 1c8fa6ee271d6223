//! Handlers for the `/tasks` resource and the completion workflow.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use projecthub_core::error::CoreError;
use projecthub_core::notification;
use projecthub_core::permissions::{ProjectAction, ProjectRelation};
use projecthub_core::realtime::{Room, ServerEvent};
use projecthub_core::status::{Priority, TaskStatus};
use projecthub_core::task::{request_completion, review_completion, validate_hours, validate_task_name};
use projecthub_core::types::DbId;
use projecthub_db::models::project::Project;
use projecthub_db::models::task::{CreateTask, Task, TaskFilter, UpdateTask};
use projecthub_db::repositories::TaskRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::access::{ensure_assignable, require_project, ProjectContext};
use crate::middleware::auth::AuthUser;
use crate::notifications::Broadcaster;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /tasks/project/{project_id}`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<DbId>,
}

/// Request body for `POST /tasks/{id}/assign`.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub user_id: DbId,
}

/// Request body for `POST /tasks/{id}/confirm-complete`.
#[derive(Debug, Deserialize)]
pub struct ConfirmCompleteRequest {
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/tasks
///
/// Any project member may create a task. An assignee, if given, must belong
/// to the project.
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<DataResponse<Task>>)> {
    let ctx = require_project(&state, &auth, input.project_id, ProjectAction::ManageTasks).await?;

    validate_task_name(&input.name)?;
    input.name = input.name.trim().to_string();
    if input.due_date.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "Due date is required".into(),
        )));
    }
    validate_enums(input.status.as_deref(), input.priority.as_deref())?;
    if let Some(hours) = input.hours {
        validate_hours(hours)?;
    }
    if let Some(assignee_id) = input.assigned_to_id {
        ensure_assignable(&state, &ctx.project, assignee_id).await?;
    }

    let task = TaskRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(
        task_id = task.id,
        project_id = task.project_id,
        created_by = auth.user_id,
        "Task created"
    );

    if let Some(assignee_id) = task.assigned_to_id {
        announce_assignment(&state, &auth, &task, &ctx.project, assignee_id).await;
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// GET /api/tasks/project/{project_id}
pub async fn list_project_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<DbId>,
    Query(params): Query<TaskListQuery>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    require_project(&state, &auth, project_id, ProjectAction::View).await?;

    let status = params.status.filter(|s| !s.is_empty());
    let priority = params.priority.filter(|p| !p.is_empty());
    validate_enums(status.as_deref(), priority.as_deref())?;

    let filter = TaskFilter {
        status,
        priority,
        assigned_to_id: params.assigned_to,
    };
    let tasks = TaskRepo::list_for_project(&state.pool, project_id, &filter).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/tasks/my
///
/// Tasks assigned to the caller in non-archived projects.
pub async fn my_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let tasks = TaskRepo::list_for_assignee(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let (task, _) = load_task(&state, &auth, id, ProjectAction::View).await?;
    Ok(Json(DataResponse { data: task }))
}

/// PUT /api/tasks/{id}
///
/// The creator, the project owner and admins may edit every field. Other
/// project members may only move the status or change attachments.
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateTask>,
) -> AppResult<Json<DataResponse<Task>>> {
    let (task, ctx) = load_task(&state, &auth, id, ProjectAction::View).await?;

    if !can_edit_details(&auth, &task, &ctx) {
        let touches_details = input.name.is_some()
            || input.description.is_some()
            || input.due_date.is_some()
            || input.priority.is_some()
            || input.assigned_to_id.is_some()
            || input.hours.is_some();
        if touches_details {
            return Err(AppError::Core(CoreError::Forbidden(
                "Only the task creator, the project owner or an admin can edit task details"
                    .into(),
            )));
        }
    }

    if let Some(name) = input.name.as_deref() {
        validate_task_name(name)?;
    }
    input.name = input.name.map(|n| n.trim().to_string());
    validate_enums(input.status.as_deref(), input.priority.as_deref())?;
    if let Some(hours) = input.hours {
        validate_hours(hours)?;
    }
    if let Some(assignee_id) = input.assigned_to_id {
        ensure_assignable(&state, &ctx.project, assignee_id).await?;
    }

    let updated = TaskRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;

    tracing::info!(task_id = id, updated_by = auth.user_id, "Task updated");

    if let Some(assignee_id) = updated.assigned_to_id {
        if task.assigned_to_id != Some(assignee_id) {
            announce_assignment(&state, &auth, &updated, &ctx.project, assignee_id).await;
        } else if assignee_id != auth.user_id {
            let broadcaster = Broadcaster::from_state(&state);
            let draft = notification::task_updated(updated.id, &updated.name);
            broadcaster.notify(&[assignee_id], Some(auth.user_id), &draft).await;
            broadcaster
                .emit(
                    Room::User(assignee_id),
                    &ServerEvent::TaskUpdated {
                        task: updated.summary(),
                    },
                )
                .await;
        }
    }

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/tasks/{id}
///
/// Allowed for the task's creator, the project owner and admins.
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let (task, ctx) = load_task(&state, &auth, id, ProjectAction::View).await?;

    if !can_edit_details(&auth, &task, &ctx) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the task creator, the project owner or an admin can delete this task".into(),
        )));
    }

    TaskRepo::delete(&state.pool, id).await?;
    tracing::info!(task_id = id, deleted_by = auth.user_id, "Task deleted");

    Ok(Json(MessageResponse {
        message: "Task deleted successfully",
    }))
}

/// POST /api/tasks/{id}/assign
pub async fn assign_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<AssignRequest>,
) -> AppResult<Json<DataResponse<Task>>> {
    let (_, ctx) = load_task(&state, &auth, id, ProjectAction::ManageTasks).await?;
    ensure_assignable(&state, &ctx.project, input.user_id).await?;

    let task = TaskRepo::set_assignee(&state.pool, id, Some(input.user_id))
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;

    tracing::info!(task_id = id, assignee_id = input.user_id, assigned_by = auth.user_id, "Task assigned");

    announce_assignment(&state, &auth, &task, &ctx.project, input.user_id).await;

    Ok(Json(DataResponse { data: task }))
}

/// POST /api/tasks/{id}/unassign
pub async fn unassign_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    load_task(&state, &auth, id, ProjectAction::ManageTasks).await?;

    let task = TaskRepo::set_assignee(&state.pool, id, None)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;

    tracing::info!(task_id = id, unassigned_by = auth.user_id, "Task unassigned");
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/tasks/{id}/request-complete
///
/// The assignee asks the creator to sign off; the task moves to `In Review`.
pub async fn request_complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let (task, _) = load_task(&state, &auth, id, ProjectAction::View).await?;

    let next = request_completion(task.task_status(), auth.user_id, task.assigned_to_id)?;
    let task = TaskRepo::set_status(&state.pool, id, next)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;

    tracing::info!(task_id = id, requested_by = auth.user_id, "Task completion requested");

    let draft = notification::completion_requested(task.id, &task.name, &auth.user.full_name);
    Broadcaster::from_state(&state)
        .notify(&[task.created_by_id], Some(auth.user_id), &draft)
        .await;

    Ok(Json(DataResponse { data: task }))
}

/// POST /api/tasks/{id}/confirm-complete
///
/// The creator accepts (`Done`) or rejects (`Blocked`) a pending request.
pub async fn confirm_complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ConfirmCompleteRequest>,
) -> AppResult<Json<DataResponse<Task>>> {
    let (task, _) = load_task(&state, &auth, id, ProjectAction::View).await?;

    let next = review_completion(task.task_status(), auth.user_id, task.created_by_id, input.confirm)?;
    let task = TaskRepo::set_status(&state.pool, id, next)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;

    tracing::info!(task_id = id, confirmed = input.confirm, reviewed_by = auth.user_id, "Task completion reviewed");

    if let Some(assignee_id) = task.assigned_to_id {
        let draft = if next == TaskStatus::Done {
            notification::completion_confirmed(task.id, &task.name)
        } else {
            notification::completion_rejected(task.id, &task.name)
        };
        Broadcaster::from_state(&state)
            .notify(&[assignee_id], Some(auth.user_id), &draft)
            .await;
    }

    Ok(Json(DataResponse { data: task }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a task and check the caller's access to its project.
async fn load_task(
    state: &AppState,
    auth: &AuthUser,
    id: DbId,
    action: ProjectAction,
) -> AppResult<(Task, ProjectContext)> {
    let task = TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;
    let ctx = require_project(state, auth, task.project_id, action).await?;
    Ok((task, ctx))
}

fn can_edit_details(auth: &AuthUser, task: &Task, ctx: &ProjectContext) -> bool {
    ctx.access.is_admin
        || ctx.access.relation == ProjectRelation::Owner
        || task.created_by_id == auth.user_id
}

fn validate_enums(status: Option<&str>, priority: Option<&str>) -> Result<(), CoreError> {
    if let Some(status) = status {
        status.parse::<TaskStatus>()?;
    }
    if let Some(priority) = priority {
        priority.parse::<Priority>()?;
    }
    Ok(())
}

/// Notify a new assignee and push `task:assigned` to them, unless they
/// assigned themselves.
async fn announce_assignment(
    state: &AppState,
    auth: &AuthUser,
    task: &Task,
    project: &Project,
    assignee_id: DbId,
) {
    if assignee_id == auth.user_id {
        return;
    }
    let broadcaster = Broadcaster::from_state(state);
    let draft = notification::task_assigned(task.id, &task.name, &project.name);
    broadcaster.notify(&[assignee_id], Some(auth.user_id), &draft).await;
    broadcaster
        .emit(
            Room::User(assignee_id),
            &ServerEvent::TaskAssigned {
                task: task.summary(),
            },
        )
        .await;
}
