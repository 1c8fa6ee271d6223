//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use projecthub_core::error::CoreError;
use projecthub_core::types::DbId;
use projecthub_db::models::user::User;
use projecthub_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `Authorization` header.
///
/// The token is verified, then the user is reloaded so deactivation and role
/// changes take effect on the next request rather than at token expiry.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user_id, role = %auth.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id.
    pub user_id: DbId,
    /// The user's current role name (e.g. `"Admin"`, `"Employee"`).
    pub role: String,
    /// The full user row.
    pub user: User,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == projecthub_core::roles::ROLE_ADMIN
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// Accepts both `Bearer <token>` and a bare `<token>`.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

/// Verify an access token and load its active user.
pub async fn authenticate(state: &AppState, token: &str) -> Result<User, AppError> {
    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    let user = UserRepo::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User not found".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Account is deactivated".into(),
        )));
    }

    Ok(user)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

        let user = authenticate(state, token).await?;

        Ok(AuthUser {
            user_id: user.id,
            role: user.role.clone(),
            user,
        })
    }
}
