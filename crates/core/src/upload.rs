//! Upload categories, accepted file types and stored file naming.

use rand::Rng;

use crate::error::CoreError;

/// Default maximum upload size: 5 MiB.
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp", "bmp", "tiff"];

pub const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

/// Extensions accepted for general attachments.
pub const FILE_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "webp", "pdf", "doc", "docx", "txt", "csv", "xls", "xlsx",
];

pub const FILE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Subdirectory of the upload root a file is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    Avatars,
    Tasks,
    Projects,
    Comments,
}

impl UploadCategory {
    pub const ALL: &'static [UploadCategory] = &[
        UploadCategory::Avatars,
        UploadCategory::Tasks,
        UploadCategory::Projects,
        UploadCategory::Comments,
    ];

    pub fn dir(self) -> &'static str {
        match self {
            UploadCategory::Avatars => "avatars",
            UploadCategory::Tasks => "tasks",
            UploadCategory::Projects => "projects",
            UploadCategory::Comments => "comments",
        }
    }

    /// Parse the `category` form field of a general file upload. Avatars
    /// have their own endpoint and are not accepted here.
    pub fn parse_attachment(value: &str) -> Result<Self, CoreError> {
        match value {
            "tasks" => Ok(UploadCategory::Tasks),
            "projects" => Ok(UploadCategory::Projects),
            "comments" => Ok(UploadCategory::Comments),
            other => Err(CoreError::Validation(format!(
                "Invalid upload category '{other}'. Must be one of: tasks, projects, comments"
            ))),
        }
    }

    fn allows(self, extension: Option<&str>, mime: Option<&str>) -> bool {
        let (extensions, mimes) = match self {
            UploadCategory::Avatars => (IMAGE_EXTENSIONS, IMAGE_MIME_TYPES),
            _ => (FILE_EXTENSIONS, FILE_MIME_TYPES),
        };
        let ext_ok = extension.is_some_and(|e| extensions.contains(&e));
        let mime_ok = mime.is_some_and(|m| mimes.contains(&m));
        match self {
            // Browsers are inconsistent with image mime types.
            UploadCategory::Avatars => ext_ok || mime_ok,
            _ => ext_ok && mime_ok,
        }
    }
}

/// Lower-cased extension of `file_name`, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (base, ext) = file_name.rsplit_once('.')?;
    if base.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check an uploaded file's name and declared content type.
pub fn validate_file(
    category: UploadCategory,
    file_name: &str,
    content_type: Option<&str>,
) -> Result<(), CoreError> {
    let extension = extension_of(file_name);
    let mime = content_type.map(|m| m.trim().to_ascii_lowercase());
    if category.allows(extension.as_deref(), mime.as_deref()) {
        return Ok(());
    }
    let message = match category {
        UploadCategory::Avatars => "Only image files are allowed",
        _ => "Invalid file type. Allowed: images, PDF, Word, Excel, text and CSV files",
    };
    Err(CoreError::Validation(message.into()))
}

/// Replace everything that is not ASCII alphanumeric with `_`.
pub fn sanitize_base_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Longest sanitized base name kept in a stored file name.
pub const MAX_STORED_BASE_LEN: usize = 100;
/// Longest sanitized extension kept in a stored file name.
pub const MAX_STORED_EXT_LEN: usize = 10;

/// Build a collision-resistant stored name:
/// `{sanitized base}-{unix millis}-{random}.{ext}`.
///
/// Base and extension are truncated so the result stays well under the
/// 255-byte file name limit whatever the client sent.
pub fn stored_file_name(original: &str, now_millis: i64) -> String {
    let (base, ext) = match original.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && !ext.is_empty() => {
            (base, Some(ext.to_ascii_lowercase()))
        }
        _ => (original, None),
    };
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    let mut base = sanitize_base_name(base);
    base.truncate(MAX_STORED_BASE_LEN);
    let stem = format!("{base}-{now_millis}-{suffix}");
    match ext {
        Some(ext) => {
            let mut ext = sanitize_base_name(&ext);
            ext.truncate(MAX_STORED_EXT_LEN);
            format!("{stem}.{ext}")
        }
        None => stem,
    }
}

/// The path returned to clients and stored on entities, e.g.
/// `uploads/avatars/me-1700000000000-42.png`.
pub fn relative_path(category: UploadCategory, stored_name: &str) -> String {
    format!("uploads/{}/{stored_name}", category.dir())
}
