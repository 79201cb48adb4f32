use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::dashboard::dtos::{DashboardDto, GlobalStatsDto, UserStatsDto};
use crate::features::files::models::FileWithMeta;
use crate::features::files::services::{ActivityService, FILE_SELECT};
use crate::shared::constants::DASHBOARD_RECENT_LIMIT;
use crate::shared::format::format_file_size;

/// Service for the home dashboard
pub struct DashboardService {
    pool: PgPool,
    activity: Arc<ActivityService>,
}

impl DashboardService {
    pub fn new(pool: PgPool, activity: Arc<ActivityService>) -> Self {
        Self { pool, activity }
    }

    pub async fn home(&self, user: &AuthenticatedUser) -> Result<DashboardDto> {
        let stats = self.user_stats(user.user_id).await?;

        let query = format!(
            "{} WHERE f.owner_id = $1 ORDER BY f.created_at DESC LIMIT $2",
            FILE_SELECT
        );
        let recent_files = sqlx::query_as::<_, FileWithMeta>(&query)
            .bind(user.user_id)
            .bind(DASHBOARD_RECENT_LIMIT)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load recent files: {:?}", e);
                AppError::Database(e)
            })?;

        let recent_activities = self
            .activity
            .recent_for_user(user.user_id, DASHBOARD_RECENT_LIMIT)
            .await?;

        let global_stats = if user.is_admin() {
            Some(self.global_stats().await?)
        } else {
            None
        };

        Ok(DashboardDto {
            stats,
            recent_files: recent_files.into_iter().map(|r| r.into()).collect(),
            recent_activities,
            global_stats,
        })
    }

    async fn user_stats(&self, user_id: Uuid) -> Result<UserStatsDto> {
        let mut stats = sqlx::query_as::<_, UserStatsDto>(
            r#"
            SELECT COUNT(*) AS total_files,
                   COALESCE(SUM(file_size), 0)::BIGINT AS total_size,
                   COUNT(*) FILTER (WHERE visibility IN ('public', 'restricted')) AS shared_files,
                   COALESCE(SUM(download_count), 0)::BIGINT AS total_downloads
            FROM files
            WHERE owner_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        stats.total_size_display = format_file_size(stats.total_size);
        Ok(stats)
    }

    async fn global_stats(&self) -> Result<GlobalStatsDto> {
        let mut stats = sqlx::query_as::<_, GlobalStatsDto>(
            r#"
            SELECT (SELECT COUNT(*) FROM users) AS total_users,
                   COUNT(*) AS total_files,
                   COALESCE(SUM(file_size), 0)::BIGINT AS total_storage,
                   COALESCE(SUM(download_count), 0)::BIGINT AS total_downloads
            FROM files
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        stats.total_storage_display = format_file_size(stats.total_storage);
        Ok(stats)
    }
}
