//! Handlers for the `/users` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use projecthub_core::error::CoreError;
use projecthub_core::pagination::PageRequest;
use projecthub_core::roles::is_valid_role;
use projecthub_core::types::DbId;
use projecthub_db::models::project::Project;
use projecthub_db::models::user::{UpdateUser, User, UserFilter, UserProjectStats, UserResponse};
use projecthub_db::repositories::{ProjectRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireManager};
use crate::response::{DataResponse, Page};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /users`.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<String>,
    pub search: Option<String>,
    pub active_only: Option<bool>,
}

/// Query parameters for `GET /users/by-email`.
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Request body for `PUT /users/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: Option<String>,
    #[validate(length(max = 255, message = "Major must be at most 255 characters"))]
    pub major: Option<String>,
    pub role: Option<String>,
}

/// Request body for `PUT /users/{id}/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// A user profile with project counts.
#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserResponse,
    pub project_stats: UserProjectStats,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/users
///
/// Paginated user directory, restricted to admins and project managers.
pub async fn list_users(
    State(state): State<AppState>,
    RequireManager(_auth): RequireManager,
    Query(params): Query<UserListQuery>,
) -> AppResult<Json<DataResponse<Page<UserResponse>>>> {
    let page = PageRequest::new(params.page, params.limit);
    let filter = UserFilter {
        role: params.role.filter(|r| !r.trim().is_empty()),
        search: params.search.filter(|s| !s.trim().is_empty()),
        active_only: params.active_only.unwrap_or(false),
    };

    let users = UserRepo::list(&state.pool, &filter, page.limit, page.offset()).await?;
    let total = UserRepo::count(&state.pool, &filter).await?;

    let items = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(DataResponse {
        data: Page::new(items, total, page),
    }))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserDetail>>> {
    let user = find_user(&state, id).await?;
    let project_stats = UserRepo::project_stats(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: UserDetail {
            user: UserResponse::from(user),
            project_stats,
        },
    }))
}

/// GET /api/users/by-email?email=
pub async fn get_user_by_email(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<EmailQuery>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let email = params
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".into()))?;

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}

/// PUT /api/users/{id}
///
/// Users may edit themselves; admins may edit anyone. Only admins can
/// change roles.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    ensure_self_or_admin(&auth, id)?;
    input.validate()?;

    if let Some(role) = input.role.as_deref() {
        if !auth.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Only admins can change user roles".into(),
            )));
        }
        if !is_valid_role(role) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid role '{role}'"
            ))));
        }
    }

    let update = UpdateUser {
        username: input.username.map(|u| u.trim().to_string()),
        email: input.email.map(|e| e.trim().to_lowercase()),
        full_name: input.full_name.map(|n| n.trim().to_string()),
        major: input.major,
        role: input.role,
    };
    let user = UserRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    tracing::info!(user_id = id, updated_by = auth.user_id, "User updated");

    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}

/// PUT /api/users/{id}/deactivate
///
/// Admin only. Admins cannot deactivate themselves.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    if id == auth.user_id {
        return Err(AppError::BadRequest(
            "Cannot deactivate your own account".into(),
        ));
    }
    set_active(&state, id, false).await
}

/// PUT /api/users/{id}/activate
pub async fn activate_user(
    State(state): State<AppState>,
    RequireAdmin(_auth): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    set_active(&state, id, true).await
}

/// PUT /api/users/{id}/change-password
///
/// The caller must be the user and must supply the current password.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    if id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only change your own password".into(),
        )));
    }

    let current_ok = verify_password(&input.current_password, &auth.user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_ok {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, id, &hash).await?;

    tracing::info!(user_id = id, "Password changed");
    Ok(Json(MessageResponse {
        message: "Password changed successfully",
    }))
}

/// GET /api/users/{id}/projects
pub async fn get_user_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    ensure_self_or_admin(&auth, id)?;
    find_user(&state, id).await?;

    let projects = ProjectRepo::list_for_user(&state.pool, id).await?;
    Ok(Json(DataResponse { data: projects }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

fn ensure_self_or_admin(auth: &AuthUser, id: DbId) -> AppResult<()> {
    if auth.user_id == id || auth.is_admin() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden("Permission denied".into())))
    }
}

async fn set_active(
    state: &AppState,
    id: DbId,
    is_active: bool,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::set_active(&state.pool, id, is_active)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    tracing::info!(user_id = id, is_active, "User activation changed");
    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}
