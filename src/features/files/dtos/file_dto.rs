use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::access::models::{Operation, Visibility};
use crate::features::files::dtos::GrantResponseDto;
use crate::features::files::models::FileWithMeta;
use crate::shared::format::format_file_size;

/// Extensions accepted on upload, lowercased with the leading dot
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".txt", ".jpg", ".jpeg", ".png", ".gif", ".mp4", ".avi", ".mov",
    ".zip", ".rar", ".xlsx", ".pptx",
];

/// Coarse file type used by listing filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TypeGroup {
    Image,
    Document,
    Video,
    Archive,
}

impl TypeGroup {
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            TypeGroup::Image => &[".jpg", ".jpeg", ".png", ".gif"],
            TypeGroup::Document => &[".pdf", ".doc", ".docx", ".txt"],
            TypeGroup::Video => &[".mp4", ".avi", ".mov"],
            TypeGroup::Archive => &[".zip", ".rar"],
        }
    }

    /// Extension list bound to `file_type = ANY($n)`
    pub fn extension_list(group: Option<TypeGroup>) -> Option<Vec<String>> {
        group.map(|g| g.extensions().iter().map(|e| e.to_string()).collect())
    }
}

/// Lowercased extension with the dot, if the name has one
pub fn file_type_from_name(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Extension of an uploaded file name, rejected unless allowed
pub fn allowed_file_type(filename: &str) -> Result<String> {
    match file_type_from_name(filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        other => Err(AppError::Validation(format!(
            "File type '{}' is not allowed. Allowed types: {}",
            other.unwrap_or_default(),
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}

/// Display name used when the upload form leaves it blank
pub fn default_display_name(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(filename)
        .to_string()
}

/// `uploads/user_{owner}/{uuid}{ext}`
pub fn storage_key(owner_id: Uuid, object_id: Uuid, file_type: &str) -> String {
    format!("uploads/user_{}/{}{}", owner_id, object_id, file_type)
}

/// `Content-Disposition` for an attachment, with an RFC 5987 UTF-8 name
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Display name; defaults to the filename without extension
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    /// "private" (default), "public" or "restricted"
    #[schema(example = "private")]
    pub visibility: Option<String>,
}

/// Fields collected from the multipart upload form
#[derive(Debug, Default)]
pub struct NewUpload {
    pub data: Vec<u8>,
    pub original_filename: String,
    pub content_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub visibility: Visibility,
}

/// Response DTO for file metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub owner_email: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub visibility: Visibility,
    /// Size in bytes
    pub file_size: i64,
    /// Size formatted for display, e.g. "1.5 MB"
    pub file_size_display: String,
    pub file_type: String,
    pub original_filename: String,
    pub content_type: String,
    pub is_favorite: bool,
    pub download_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FileWithMeta> for FileResponseDto {
    fn from(row: FileWithMeta) -> Self {
        let f = row.file;
        Self {
            id: f.id,
            name: f.name,
            description: f.description,
            owner_id: f.owner_id,
            owner_username: row.owner_username,
            owner_email: row.owner_email,
            category_id: f.category_id,
            category_name: row.category_name,
            visibility: f.visibility,
            file_size_display: format_file_size(f.file_size),
            file_size: f.file_size,
            file_type: f.file_type,
            original_filename: f.original_filename,
            content_type: f.content_type,
            is_favorite: f.is_favorite,
            download_count: f.download_count,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

/// File metadata plus what the caller may do with it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileDetailDto {
    #[serde(flatten)]
    pub file: FileResponseDto,
    pub is_owner: bool,
    pub operations: Vec<Operation>,
    /// Present for the owner only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_with: Option<Vec<GrantResponseDto>>,
}

/// Request DTO for updating file metadata
///
/// Omitted fields are left unchanged; `category_id: null` clears the category.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFileDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,

    pub visibility: Option<Visibility>,
}

impl UpdateFileDto {
    /// Changes only the owner may make
    pub fn touches_owner_fields(&self) -> bool {
        self.category_id.is_some() || self.visibility.is_some()
    }
}

fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Filters for the caller's own files
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct FileListQuery {
    /// Case-insensitive match on name or description
    pub q: Option<String>,
    /// Category ID
    pub category: Option<Uuid>,
    /// image, document, video or archive
    #[serde(rename = "type")]
    #[param(value_type = Option<String>)]
    pub file_type: Option<TypeGroup>,
    /// Only favorites when true
    pub favorites: Option<bool>,
}

/// Filter for files shared with the caller
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct SharedFilesQuery {
    /// Case-insensitive match on name or description
    pub q: Option<String>,
}

/// Aggregate numbers over the caller's own files
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct FileStatsDto {
    pub total_files: i64,
    pub favorite_files: i64,
    /// Public plus restricted files
    pub shared_files: i64,
    pub total_size: i64,
    #[sqlx(skip)]
    pub total_size_display: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MyFilesDto {
    pub files: Vec<FileResponseDto>,
    pub stats: FileStatsDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicFilesDto {
    pub files: Vec<FileResponseDto>,
    pub total_public_files: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FavoriteDto {
    pub id: Uuid,
    pub is_favorite: bool,
}
