//! Handlers for the `/comments` resource.
//!
//! Comments hang off a project or a task and support one level of replies.
//! A new comment is pushed live to the project room and every other project
//! participant gets a `comment_added` notification.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use projecthub_core::error::CoreError;
use projecthub_core::notification;
use projecthub_core::permissions::ProjectAction;
use projecthub_core::realtime::{Room, ServerEvent};
use projecthub_core::status::CommentTarget;
use projecthub_core::types::DbId;
use projecthub_db::models::comment::{CommentThread, CommentView, CreateComment, UpdateComment};
use projecthub_db::models::project::Project;
use projecthub_db::repositories::{CommentRepo, ProjectRepo, TaskRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::access::check_access;
use crate::middleware::auth::AuthUser;
use crate::notifications::Broadcaster;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /comments`.
#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// The project a comment target belongs to, plus the target's display name.
struct ResolvedTarget {
    project: Project,
    name: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/comments?entity_type=&entity_id=
///
/// Top-level comments, newest first, each with its replies oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<CommentListQuery>,
) -> AppResult<Json<DataResponse<Vec<CommentThread>>>> {
    let (Some(entity_type), Some(entity_id)) = (params.entity_type, params.entity_id) else {
        return Err(AppError::BadRequest(
            "entity_type and entity_id are required".into(),
        ));
    };
    let target: CommentTarget = entity_type.parse()?;

    let resolved = resolve_target(&state, target, entity_id).await?;
    check_access(&state, &auth, &resolved.project, ProjectAction::View).await?;

    let top_level = CommentRepo::list_top_level(&state.pool, target.as_str(), entity_id).await?;
    let parent_ids: Vec<DbId> = top_level.iter().map(|c| c.id).collect();
    let replies = CommentRepo::list_replies(&state.pool, &parent_ids).await?;

    let mut by_parent: HashMap<DbId, Vec<CommentView>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id {
            by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    let threads = top_level
        .into_iter()
        .map(|comment| CommentThread {
            replies: by_parent.remove(&comment.id).unwrap_or_default(),
            comment,
        })
        .collect();

    Ok(Json(DataResponse { data: threads }))
}

/// POST /api/comments
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<CreateComment>,
) -> AppResult<(StatusCode, Json<DataResponse<CommentView>>)> {
    let target: CommentTarget = input.entity_type.parse()?;
    input.entity_type = target.as_str().to_string();

    input.content = input.content.trim().to_string();
    if input.content.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Comment content is required".into(),
        )));
    }

    let resolved = resolve_target(&state, target, input.entity_id).await?;
    check_access(&state, &auth, &resolved.project, ProjectAction::Comment).await?;

    if let Some(parent_id) = input.parent_id {
        let parent = CommentRepo::find_by_id(&state.pool, parent_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Parent comment not found".into()))?;
        if parent.entity_type != input.entity_type || parent.entity_id != input.entity_id {
            return Err(AppError::BadRequest(
                "Parent comment belongs to a different item".into(),
            ));
        }
        if parent.parent_id.is_some() {
            return Err(AppError::BadRequest(
                "Replies can only be made to top-level comments".into(),
            ));
        }
    }

    let comment = CommentRepo::create(&state.pool, auth.user_id, &input).await?;
    let view = CommentRepo::find_view_by_id(&state.pool, comment.id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Comment {} vanished after insert", comment.id)))?;

    tracing::info!(
        comment_id = view.id,
        entity_type = %target,
        entity_id = view.entity_id,
        project_id = resolved.project.id,
        author_id = auth.user_id,
        "Comment created"
    );

    fan_out(&state, &auth, target, &resolved, &view).await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// PUT /api/comments/{id}
///
/// Only the author can edit a comment.
pub async fn update_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateComment>,
) -> AppResult<Json<DataResponse<CommentView>>> {
    let comment = CommentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id,
        }))?;

    if comment.user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only edit your own comments".into(),
        )));
    }

    let content = input.content.trim();
    if content.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Comment content is required".into(),
        )));
    }

    CommentRepo::update_content(&state.pool, id, content).await?;
    let view = CommentRepo::find_view_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id,
        }))?;

    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/comments/{id}
///
/// Soft-deletes the comment and its replies. Allowed for the author and
/// admins.
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let comment = CommentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id,
        }))?;

    if comment.user_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only delete your own comments".into(),
        )));
    }

    let deleted = CommentRepo::soft_delete_with_replies(&state.pool, id).await?;
    tracing::info!(comment_id = id, deleted, deleted_by = auth.user_id, "Comment deleted");

    Ok(Json(MessageResponse {
        message: "Comment deleted successfully",
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Find the project behind a comment target. A missing target is a bad
/// request rather than a 404, since the id came from the request body.
async fn resolve_target(
    state: &AppState,
    target: CommentTarget,
    entity_id: DbId,
) -> AppResult<ResolvedTarget> {
    let not_found = || AppError::BadRequest(format!("{target} not found"));

    let (project_id, name) = match target {
        CommentTarget::Project => (entity_id, None),
        CommentTarget::Task => {
            let task = TaskRepo::find_by_id(&state.pool, entity_id)
                .await?
                .ok_or_else(not_found)?;
            (task.project_id, Some(task.name))
        }
    };

    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(not_found)?;
    let name = name.unwrap_or_else(|| project.name.clone());

    Ok(ResolvedTarget { project, name })
}

/// Push `comment:created` to the project room and notify every other
/// participant.
async fn fan_out(
    state: &AppState,
    auth: &AuthUser,
    target: CommentTarget,
    resolved: &ResolvedTarget,
    view: &CommentView,
) {
    let broadcaster = Broadcaster::from_state(state);
    let project_id = resolved.project.id;

    broadcaster
        .emit_except_user(
            Room::Project(project_id),
            &ServerEvent::CommentCreated {
                comment: view.summary(),
            },
            auth.user_id,
        )
        .await;

    let participants = match ProjectRepo::participant_ids(&state.pool, project_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(project_id, error = %e, "Failed to load comment recipients");
            return;
        }
    };

    let draft = notification::comment_added(&auth.user.full_name, target, &resolved.name, view.id);
    broadcaster
        .notify(&participants, Some(auth.user_id), &draft)
        .await;
}
