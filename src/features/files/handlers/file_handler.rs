use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientIp};
use crate::features::access::models::Visibility;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    content_disposition, FavoriteDto, FileDetailDto, FileListQuery, FileResponseDto, MyFilesDto,
    NewUpload, PublicFilesDto, SharedFilesQuery, UpdateFileDto, UploadFileDto,
};
use crate::features::files::services::FileService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    }
}

/// List the caller's own files
#[utoipa::path(
    get,
    path = "/api/files",
    params(FileListQuery, PaginationQuery),
    responses(
        (status = 200, description = "Own files with totals", body = ApiResponse<MyFilesDto>),
        (status = 401, description = "Authentication required")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_my_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Query(query): Query<FileListQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<MyFilesDto>>> {
    let (files, total) = service
        .list_my_files(user.user_id, &query, &pagination)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Upload a file
///
/// Accepts multipart/form-data with:
/// - `file`: The file to upload (required)
/// - `name`, `description`: Optional metadata
/// - `category_id`: Optional category
/// - `visibility`: "private" (default), "public" or "restricted"
#[utoipa::path(
    post,
    path = "/api/files",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form with optional name, description, category and visibility",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Invalid file or validation error"),
        (status = 401, description = "Authentication required"),
        (status = 413, description = "File too large")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    user: AuthenticatedUser,
    ClientIp(ip): ClientIp,
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponseDto>>)> {
    let mut upload = NewUpload::default();
    let mut has_file = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                upload.content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                upload.original_filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                let data = field.bytes().await.map_err(multipart_error)?;
                service.ensure_within_limit(data.len())?;
                upload.data = data.to_vec();
                has_file = true;
            }
            "name" | "description" | "category_id" | "visibility" => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }

                match field_name.as_str() {
                    "name" => upload.name = Some(text.to_string()),
                    "description" => upload.description = Some(text.to_string()),
                    "category_id" => {
                        upload.category_id = Some(text.parse::<Uuid>().map_err(|_| {
                            AppError::Validation("Invalid category ID".to_string())
                        })?);
                    }
                    _ => {
                        upload.visibility =
                            text.parse::<Visibility>().map_err(AppError::Validation)?;
                    }
                }
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    if !has_file {
        return Err(AppError::BadRequest("File is required".to_string()));
    }
    if upload.original_filename.trim().is_empty() {
        return Err(AppError::BadRequest("Filename is required".to_string()));
    }

    let response = service
        .upload(user.user_id, upload, ip.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(response),
            Some("File uploaded successfully".to_string()),
            None,
        )),
    ))
}

/// Get file details
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = ApiResponse<FileDetailDto>),
        (status = 403, description = "Not allowed to view this file"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    user: AuthenticatedUser,
    ClientIp(ip): ClientIp,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileDetailDto>>> {
    let file = service.view(user.user_id, id, ip.as_deref()).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// Download file content as an attachment
#[utoipa::path(
    get,
    path = "/api/files/{id}/download",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 403, description = "Not allowed to download this file"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    user: AuthenticatedUser,
    ClientIp(ip): ClientIp,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let download = service.download(user.user_id, id, ip.as_deref()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, download.content_type),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&download.filename),
            ),
            (header::CONTENT_LENGTH, download.data.len().to_string()),
        ],
        download.data,
    )
        .into_response())
}

/// Update file metadata
///
/// Editors may rename and describe; only the owner may change visibility or category.
#[utoipa::path(
    patch,
    path = "/api/files/{id}",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    request_body = UpdateFileDto,
    responses(
        (status = 200, description = "File updated", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not allowed to edit this file"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_file(
    user: AuthenticatedUser,
    ClientIp(ip): ClientIp,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateFileDto>,
) -> Result<Json<ApiResponse<FileResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service.update(user.user_id, id, dto, ip.as_deref()).await?;
    Ok(Json(ApiResponse::success(
        Some(file),
        Some("File updated successfully".to_string()),
        None,
    )))
}

/// Delete a file
///
/// Only the owner of the file can delete it.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted successfully"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not authorized to delete this file"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    ClientIp(ip): ClientIp,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(user.user_id, id, ip.as_deref()).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("File deleted successfully".to_string()),
        None,
    )))
}

/// Toggle the favorite flag on an owned file
#[utoipa::path(
    post,
    path = "/api/files/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "New favorite state", body = ApiResponse<FavoriteDto>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_favorite(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FavoriteDto>>> {
    let favorite = service.toggle_favorite(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(favorite), None, None)))
}

/// Files other users have shared with the caller
#[utoipa::path(
    get,
    path = "/api/files/shared",
    params(SharedFilesQuery, PaginationQuery),
    responses(
        (status = 200, description = "Shared files", body = ApiResponse<Vec<FileResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn shared_with_me(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Query(query): Query<SharedFilesQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>> {
    let (files, total) = service
        .shared_with_me(user.user_id, &query, &pagination)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Browse other users' public files
#[utoipa::path(
    get,
    path = "/api/files/public",
    params(FileListQuery, PaginationQuery),
    responses(
        (status = 200, description = "Public files", body = ApiResponse<PublicFilesDto>),
        (status = 403, description = "Public browsing disabled")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn public_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Query(query): Query<FileListQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<PublicFilesDto>>> {
    let (files, total) = service
        .public_files(user.user_id, &query, &pagination)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}
