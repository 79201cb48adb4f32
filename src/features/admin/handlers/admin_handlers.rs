use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientIp};
use crate::features::admin::dtos::*;
use crate::features::admin::services::AdminService;
use crate::features::auth::guards::RequireAdmin;
use crate::features::files::dtos::FileResponseDto;
use crate::features::settings::dtos::{SettingResponseDto, UpdateSettingDto};
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List users with file totals (paginated)
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(AdminUserQuery, PaginationQuery),
    responses(
        (status = 200, description = "List of users", body = ApiResponse<Vec<AdminUserDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(query): Query<AdminUserQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<AdminUserDto>>>> {
    let (items, total) = service.list_users(&query, &pagination).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Activate or deactivate a user
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/toggle-status",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "New account state", body = ApiResponse<UserStatusDto>),
        (status = 400, description = "Cannot target own account"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "User not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_user_status(
    RequireAdmin(admin): RequireAdmin,
    ClientIp(ip): ClientIp,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserStatusDto>>> {
    let status = service
        .toggle_user_status(&admin, id, ip.as_deref())
        .await?;

    let message = if status.is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };

    Ok(Json(ApiResponse::success(
        Some(status),
        Some(message.to_string()),
        None,
    )))
}

/// List all files (paginated)
#[utoipa::path(
    get,
    path = "/api/admin/files",
    params(AdminFileQuery, PaginationQuery),
    responses(
        (status = 200, description = "List of files", body = ApiResponse<Vec<FileResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(query): Query<AdminFileQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>> {
    let (items, total) = service.list_files(&query, &pagination).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Delete any file
#[utoipa::path(
    delete,
    path = "/api/admin/files/{id}",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "File not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    RequireAdmin(admin): RequireAdmin,
    ClientIp(ip): ClientIp,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_file(&admin, id, ip.as_deref()).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("File deleted successfully".to_string()),
        None,
    )))
}

/// Installation-wide statistics
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "System statistics", body = ApiResponse<SystemStatsDto>),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn system_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<AdminService>>,
) -> Result<Json<ApiResponse<SystemStatsDto>>> {
    let stats = service.system_stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// List system settings
#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "System settings", body = ApiResponse<Vec<SettingResponseDto>>),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_settings(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<AdminService>>,
) -> Result<Json<ApiResponse<Vec<SettingResponseDto>>>> {
    let settings = service.list_settings().await?;
    Ok(Json(ApiResponse::success(Some(settings), None, None)))
}

/// Create or update a system setting
#[utoipa::path(
    put,
    path = "/api/admin/settings/{key}",
    params(
        ("key" = String, Path, description = "Setting key")
    ),
    request_body = UpdateSettingDto,
    responses(
        (status = 200, description = "Setting saved", body = ApiResponse<SettingResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_setting(
    RequireAdmin(admin): RequireAdmin,
    ClientIp(ip): ClientIp,
    State(service): State<Arc<AdminService>>,
    Path(key): Path<String>,
    AppJson(dto): AppJson<UpdateSettingDto>,
) -> Result<Json<ApiResponse<SettingResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let setting = service
        .update_setting(&admin, &key, dto, ip.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(
        Some(setting),
        Some("Setting updated successfully".to_string()),
        None,
    )))
}

/// Audit log of administrative actions (paginated)
#[utoipa::path(
    get,
    path = "/api/admin/activities",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Admin actions", body = ApiResponse<Vec<UserActivityDto>>),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_user_activities(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<UserActivityDto>>>> {
    let (items, total) = service.list_user_activities(&pagination).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}
