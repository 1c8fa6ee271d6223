//! Handlers for multipart file uploads.
//!
//! Files land under `{UPLOAD_DIR}/{category}/{stored name}` and are served
//! back from `/uploads`. Clients store the returned relative `file_path` on
//! whatever entity the file belongs to.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use projecthub_core::upload::{relative_path, stored_file_name, validate_file, UploadCategory};
use projecthub_db::models::user::UserResponse;
use projecthub_db::repositories::UserRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A stored upload.
#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub file_path: String,
    pub file_name: String,
    pub original_name: String,
    pub mime_type: Option<String>,
    pub size: usize,
}

/// Response for `POST /upload/avatar`.
#[derive(Debug, Serialize)]
pub struct AvatarUploaded {
    #[serde(flatten)]
    pub file: UploadedFile,
    pub user: UserResponse,
}

/// A file field pulled out of a multipart body.
struct FilePart {
    original_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/upload/avatar
///
/// Multipart field `avatar`, images only. Replaces the caller's avatar.
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<AvatarUploaded>>)> {
    let mut part: Option<FilePart> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("avatar") {
            part = Some(read_file_field(field).await?);
        }
    }

    let part = part.ok_or_else(|| {
        AppError::BadRequest("No file uploaded. Expected field name: avatar".into())
    })?;

    let file = store(&state, UploadCategory::Avatars, part).await?;
    let user = UserRepo::update_avatar(&state.pool, auth.user_id, &file.file_path)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    tracing::info!(user_id = auth.user_id, file_path = %file.file_path, "Avatar uploaded");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: AvatarUploaded {
                file,
                user: UserResponse::from(user),
            },
        }),
    ))
}

/// POST /api/upload/file
///
/// Multipart field `file` plus an optional `category` field
/// (`tasks`, `projects` or `comments`, default `tasks`).
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<UploadedFile>>)> {
    let mut part: Option<FilePart> = None;
    let mut category = UploadCategory::Tasks;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "file" => part = Some(read_file_field(field).await?),
            "category" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                category = UploadCategory::parse_attachment(text.trim())?;
            }
            _ => {}
        }
    }

    let part = part.ok_or_else(|| {
        AppError::BadRequest("No file uploaded. Expected field name: file".into())
    })?;

    let file = store(&state, category, part).await?;
    tracing::info!(
        user_id = auth.user_id,
        category = category.dir(),
        file_path = %file.file_path,
        "File uploaded"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: file })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn read_file_field(field: axum::extract::multipart::Field<'_>) -> AppResult<FilePart> {
    let original_name = field.file_name().unwrap_or("").to_string();
    let content_type = field.content_type().map(str::to_string);
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(FilePart {
        original_name,
        content_type,
        data: data.to_vec(),
    })
}

/// Validate a file part and write it below the upload root.
async fn store(state: &AppState, category: UploadCategory, part: FilePart) -> AppResult<UploadedFile> {
    if part.original_name.is_empty() || part.data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    let max = state.config.max_file_size;
    if part.data.len() > max {
        return Err(AppError::BadRequest(format!(
            "File too large. Maximum size is {} bytes",
            max
        )));
    }
    validate_file(category, &part.original_name, part.content_type.as_deref())?;

    let dir = state.config.upload_dir.join(category.dir());
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload directory: {e}")))?;

    let file_name = stored_file_name(&part.original_name, Utc::now().timestamp_millis());
    tokio::fs::write(dir.join(&file_name), &part.data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

    Ok(UploadedFile {
        file_path: relative_path(category, &file_name),
        file_name,
        original_name: part.original_name,
        mime_type: part.content_type,
        size: part.data.len(),
    })
}
