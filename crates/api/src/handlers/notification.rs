//! Handlers for the caller's own notifications.
//!
//! Every operation is scoped to the authenticated user; ids that belong to
//! someone else behave exactly like ids that do not exist.

use axum::extract::{Path, Query, State};
use axum::Json;
use projecthub_core::pagination::PageRequest;
use projecthub_core::types::DbId;
use projecthub_db::models::notification::Notification;
use projecthub_db::repositories::NotificationRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, Page};
use crate::state::AppState;

/// Default page size for notification listings.
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 20;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub unread_only: Option<bool>,
}

/// A page of notifications plus the caller's total unread count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    #[serde(flatten)]
    pub page: Page<Notification>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    pub message: &'static str,
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<NotificationListQuery>,
) -> AppResult<Json<DataResponse<NotificationPage>>> {
    let page = PageRequest::with_default_limit(params.page, params.limit, DEFAULT_NOTIFICATION_LIMIT);
    let unread_only = params.unread_only.unwrap_or(false);

    let items = NotificationRepo::list_for_user(
        &state.pool,
        auth.user_id,
        unread_only,
        page.limit,
        page.offset(),
    )
    .await?;
    let total = NotificationRepo::count_for_user(&state.pool, auth.user_id, unread_only).await?;
    let unread_count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;

    Ok(Json(DataResponse {
        data: NotificationPage {
            page: Page::new(items, total, page),
            unread_count,
        },
    }))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let unread_count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UnreadCount { unread_count },
    }))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let notification = NotificationRepo::mark_read(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(DataResponse { data: notification }))
}

/// PUT /api/notifications/mark-all-read
///
/// Idempotent: a second call updates nothing and still succeeds.
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let updated = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    tracing::debug!(user_id = auth.user_id, updated, "Marked all notifications read");
    Ok(Json(MarkAllReadResponse {
        message: "All notifications marked as read",
        updated,
    }))
}

/// DELETE /api/notifications/{id}
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !NotificationRepo::delete(&state.pool, id, auth.user_id).await? {
        return Err(not_found());
    }
    Ok(Json(MessageResponse {
        message: "Notification deleted successfully",
    }))
}

fn not_found() -> AppError {
    AppError::NotFound("Notification not found".into())
}
