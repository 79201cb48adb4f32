use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientIp};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{GrantResponseDto, ShareFileDto};
use crate::features::files::services::ShareService;
use crate::shared::types::ApiResponse;

/// Share a restricted file with another user
#[utoipa::path(
    post,
    path = "/api/files/{id}/shares",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    request_body = ShareFileDto,
    responses(
        (status = 201, description = "Access granted", body = ApiResponse<GrantResponseDto>),
        (status = 400, description = "File is not restricted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File or user not found")
    ),
    tag = "sharing",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn share_file(
    user: AuthenticatedUser,
    ClientIp(ip): ClientIp,
    State(service): State<Arc<ShareService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ShareFileDto>,
) -> Result<(StatusCode, Json<ApiResponse<GrantResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let grant = service.share(&user, id, dto, ip.as_deref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(grant),
            Some("File shared successfully".to_string()),
            None,
        )),
    ))
}

/// List who has access to an owned file
#[utoipa::path(
    get,
    path = "/api/files/{id}/shares",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Grants on the file", body = ApiResponse<Vec<GrantResponseDto>>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    tag = "sharing",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_grants(
    user: AuthenticatedUser,
    State(service): State<Arc<ShareService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<GrantResponseDto>>>> {
    let grants = service.list_grants(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(grants), None, None)))
}

/// Revoke a grant
#[utoipa::path(
    delete,
    path = "/api/shares/{id}",
    params(
        ("id" = Uuid, Path, description = "Grant ID")
    ),
    responses(
        (status = 200, description = "Access removed"),
        (status = 403, description = "Not the owner of the file"),
        (status = 404, description = "Grant not found")
    ),
    tag = "sharing",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_access(
    user: AuthenticatedUser,
    State(service): State<Arc<ShareService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.remove_access(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Access removed successfully".to_string()),
        None,
    )))
}
