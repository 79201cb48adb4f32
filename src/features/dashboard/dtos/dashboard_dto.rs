use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::features::files::dtos::{FileActivityDto, FileResponseDto};

/// Totals over the caller's own files
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, FromRow)]
pub struct UserStatsDto {
    pub total_files: i64,
    pub total_size: i64,
    #[sqlx(skip)]
    pub total_size_display: String,
    /// Public plus restricted files
    pub shared_files: i64,
    pub total_downloads: i64,
}

/// Installation-wide totals, shown to admins
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, FromRow)]
pub struct GlobalStatsDto {
    pub total_users: i64,
    pub total_files: i64,
    pub total_storage: i64,
    #[sqlx(skip)]
    pub total_storage_display: String,
    pub total_downloads: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardDto {
    pub stats: UserStatsDto,
    pub recent_files: Vec<FileResponseDto>,
    pub recent_activities: Vec<FileActivityDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_stats: Option<GlobalStatsDto>,
}
