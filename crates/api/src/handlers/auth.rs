//! Handlers for the `/auth` resource (register, login, refresh, profile).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use projecthub_core::error::CoreError;
use projecthub_core::roles::{is_valid_role, DEFAULT_ROLE, ROLE_ADMIN};
use projecthub_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use projecthub_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, validate_refresh_token};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,
    pub role: Option<String>,
    #[validate(length(max = 255, message = "Major must be at most 255 characters"))]
    pub major: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Request body for `PUT /auth/profile`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: Option<String>,
    #[validate(length(max = 255, message = "Major must be at most 255 characters"))]
    pub major: Option<String>,
}

/// Successful authentication response returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    pub user: UserResponse,
}

/// Response for `POST /auth/refresh`.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create an account and sign it in. Self-registration as `Admin` is refused.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    input.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let role = match input.role.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_ROLE.to_string(),
        Some(ROLE_ADMIN) => {
            return Err(AppError::Core(CoreError::Validation(
                "Cannot self-register with the Admin role".into(),
            )));
        }
        Some(role) if is_valid_role(role) => role.to_string(),
        Some(other) => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid role '{other}'"
            ))));
        }
    };

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username.trim().to_string(),
            email: normalize_email(&input.email),
            password_hash,
            full_name: input.full_name.trim().to_string(),
            role,
            major: input.major,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    let response = auth_response(&state, user, "User registered successfully")?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
///
/// Authenticate with email + password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    input.validate()?;

    let invalid =
        || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, &normalize_email(&input.email))
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Account is deactivated".into(),
        )));
    }

    UserRepo::record_login(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(auth_response(&state, user, "Login successful")?))
}

/// POST /api/auth/refresh
///
/// Exchange a refresh token for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let refresh_token = input
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Refresh token required".into())))?;

    let claims = validate_refresh_token(&refresh_token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        ))
    })?;

    let user = UserRepo::find_by_id(&state.pool, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    let token = generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(RefreshResponse { token }))
}

/// GET /api/auth/profile
pub async fn get_profile(auth: AuthUser) -> AppResult<Json<DataResponse<UserResponse>>> {
    Ok(Json(DataResponse {
        data: UserResponse::from(auth.user),
    }))
}

/// PUT /api/auth/profile
///
/// Only the full name and major can be changed here.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input.validate()?;

    let update = UpdateUser {
        full_name: input.full_name.map(|n| n.trim().to_string()),
        major: input.major,
        ..Default::default()
    };
    let user = UserRepo::update(&state.pool, auth.user_id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn auth_response(state: &AppState, user: User, message: &'static str) -> AppResult<AuthResponse> {
    let token = generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    let refresh_token = generate_refresh_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        message,
        token,
        refresh_token,
        user: UserResponse::from(user),
    })
}
