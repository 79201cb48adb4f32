use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::admin::dtos::*;
use crate::features::admin::models::UserActivity;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::FileResponseDto;
use crate::features::files::models::FileWithMeta;
use crate::features::files::services::{fetch_file, ActivityService, FileService, FILE_SELECT};
use crate::features::settings::dtos::{SettingResponseDto, UpdateSettingDto};
use crate::features::settings::SettingsService;
use crate::shared::constants::ADMIN_PAGE_SIZE;
use crate::shared::format::{format_file_size, like_pattern};
use crate::shared::types::PaginationQuery;

const TOP_USERS_LIMIT: i64 = 10;
const RECENT_ACTIVITY_LIMIT: i64 = 20;

/// Service for admin queries and actions
pub struct AdminService {
    pool: PgPool,
    files: Arc<FileService>,
    activity: Arc<ActivityService>,
    settings: Arc<SettingsService>,
}

impl AdminService {
    pub fn new(
        pool: PgPool,
        files: Arc<FileService>,
        activity: Arc<ActivityService>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            pool,
            files,
            activity,
            settings,
        }
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// List users with their file totals, newest first
    pub async fn list_users(
        &self,
        query: &AdminUserQuery,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<AdminUserDto>, i64)> {
        let pattern = like_pattern(query.search.as_deref());
        let active = query.wants_active();

        let filters = r#"
            WHERE ($1::text IS NULL
                   OR u.first_name ILIKE $1
                   OR u.last_name ILIKE $1
                   OR u.email ILIKE $1
                   OR u.username ILIKE $1)
              AND ($2::user_role IS NULL OR u.role = $2)
              AND ($3::boolean IS NULL
                   OR ($3 AND u.is_active AND u.is_verified)
                   OR (NOT $3 AND NOT (u.is_active AND u.is_verified)))
        "#;

        let count_query = format!("SELECT COUNT(*) FROM users u {}", filters);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(&pattern)
            .bind(query.role)
            .bind(active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count users: {:?}", e);
                AppError::Database(e)
            })?;

        let list_query = format!(
            r#"
            SELECT u.*,
                   COUNT(f.id) AS file_count,
                   COALESCE(SUM(f.file_size), 0)::BIGINT AS total_size
            FROM users u
            LEFT JOIN files f ON f.owner_id = u.id
            {}
            GROUP BY u.id
            ORDER BY u.created_at DESC
            OFFSET $4 LIMIT $5
            "#,
            filters
        );
        let rows = sqlx::query_as::<_, AdminUserRow>(&list_query)
            .bind(&pattern)
            .bind(query.role)
            .bind(active)
            .bind(pagination.offset(ADMIN_PAGE_SIZE))
            .bind(pagination.limit(ADMIN_PAGE_SIZE))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list users: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((rows.into_iter().map(|r| r.into()).collect(), total))
    }

    /// Flip a user's active flag; admins cannot target themselves
    pub async fn toggle_user_status(
        &self,
        admin: &AuthenticatedUser,
        user_id: Uuid,
        ip_address: Option<&str>,
    ) -> Result<UserStatusDto> {
        if admin.user_id == user_id {
            return Err(AppError::BadRequest(
                "You cannot deactivate your own account.".to_string(),
            ));
        }

        let (id, email, is_active): (Uuid, String, bool) = sqlx::query_as(
            r#"
            UPDATE users
            SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, is_active
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        let verb = if is_active { "Activated" } else { "Deactivated" };
        self.log_admin_action(
            admin.user_id,
            "toggle_user_status",
            &format!("{} user {}", verb, email),
            ip_address,
        )
        .await?;

        tracing::info!("User {} {} by admin {}", id, verb.to_lowercase(), admin.user_id);

        Ok(UserStatusDto {
            id,
            email,
            is_active,
        })
    }

    // =========================================================================
    // FILES
    // =========================================================================

    /// List every file, newest first
    pub async fn list_files(
        &self,
        query: &AdminFileQuery,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<FileResponseDto>, i64)> {
        let pattern = like_pattern(query.search.as_deref());
        let owner = query
            .owner
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty());

        let filters = r#"
            WHERE ($1::text IS NULL OR f.name ILIKE $1 OR f.description ILIKE $1)
              AND ($2::text IS NULL OR LOWER(u.email) = LOWER($2))
              AND ($3::uuid IS NULL OR f.category_id = $3)
              AND ($4::file_visibility IS NULL OR f.visibility = $4)
        "#;

        let count_query = format!(
            "SELECT COUNT(*) FROM files f JOIN users u ON u.id = f.owner_id {}",
            filters
        );
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(&pattern)
            .bind(owner)
            .bind(query.category)
            .bind(query.visibility)
            .fetch_one(&self.pool)
            .await?;

        let list_query = format!(
            "{} {} ORDER BY f.created_at DESC OFFSET $5 LIMIT $6",
            FILE_SELECT, filters
        );
        let rows = sqlx::query_as::<_, FileWithMeta>(&list_query)
            .bind(&pattern)
            .bind(owner)
            .bind(query.category)
            .bind(query.visibility)
            .bind(pagination.offset(ADMIN_PAGE_SIZE))
            .bind(pagination.limit(ADMIN_PAGE_SIZE))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list files: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((rows.into_iter().map(|r| r.into()).collect(), total))
    }

    /// Remove any file regardless of owner
    pub async fn delete_file(
        &self,
        admin: &AuthenticatedUser,
        file_id: Uuid,
        ip_address: Option<&str>,
    ) -> Result<()> {
        let file = fetch_file(&self.pool, file_id).await?;

        self.files.remove(&file).await?;

        self.log_admin_action(
            admin.user_id,
            "delete_file",
            &format!("Deleted file '{}' owned by {}", file.name, file.owner_id),
            ip_address,
        )
        .await
    }

    // =========================================================================
    // STATS
    // =========================================================================

    pub async fn system_stats(&self) -> Result<SystemStatsDto> {
        let counters = sqlx::query_as::<_, SystemCounters>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM files) AS total_files,
                (SELECT COUNT(*) FROM files WHERE created_at >= NOW() - INTERVAL '7 days') AS files_this_week,
                (SELECT COUNT(*) FROM files WHERE created_at >= NOW() - INTERVAL '30 days') AS files_this_month,
                (SELECT COALESCE(SUM(file_size), 0)::BIGINT FROM files) AS total_storage,
                (SELECT COALESCE(SUM(download_count), 0)::BIGINT FROM files) AS total_downloads,
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM users WHERE is_active AND is_verified) AS active_users,
                (SELECT COUNT(*) FROM users WHERE created_at >= NOW() - INTERVAL '7 days') AS new_users_this_week,
                (SELECT COUNT(*) FROM file_activities WHERE created_at >= NOW() - INTERVAL '7 days') AS activities_this_week
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute system stats: {:?}", e);
            AppError::Database(e)
        })?;

        let file_types = sqlx::query_as::<_, FileTypeCountDto>(
            r#"
            SELECT file_type, COUNT(*) AS count
            FROM files
            GROUP BY file_type
            ORDER BY count DESC, file_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut top_users = sqlx::query_as::<_, TopUserDto>(
            r#"
            SELECT u.id, u.username, u.email,
                   COUNT(f.id) AS file_count,
                   COALESCE(SUM(f.file_size), 0)::BIGINT AS total_size
            FROM users u
            JOIN files f ON f.owner_id = u.id
            GROUP BY u.id
            ORDER BY file_count DESC, u.username
            LIMIT $1
            "#,
        )
        .bind(TOP_USERS_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        for user in &mut top_users {
            user.total_size_display = format_file_size(user.total_size);
        }

        let recent_activities = self.activity.recent(RECENT_ACTIVITY_LIMIT).await?;

        Ok(SystemStatsDto {
            total_files: counters.total_files,
            files_this_week: counters.files_this_week,
            files_this_month: counters.files_this_month,
            total_storage: counters.total_storage,
            total_storage_display: format_file_size(counters.total_storage),
            total_users: counters.total_users,
            active_users: counters.active_users,
            new_users_this_week: counters.new_users_this_week,
            total_downloads: counters.total_downloads,
            activities_this_week: counters.activities_this_week,
            file_types,
            top_users,
            recent_activities,
        })
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    pub async fn list_settings(&self) -> Result<Vec<SettingResponseDto>> {
        self.settings.list().await
    }

    pub async fn update_setting(
        &self,
        admin: &AuthenticatedUser,
        key: &str,
        dto: UpdateSettingDto,
        ip_address: Option<&str>,
    ) -> Result<SettingResponseDto> {
        let setting = self.settings.upsert(key, dto, admin.user_id).await?;

        self.log_admin_action(
            admin.user_id,
            "update_setting",
            &format!("Set {} = {}", setting.key, setting.value),
            ip_address,
        )
        .await?;

        Ok(setting)
    }

    // =========================================================================
    // AUDIT
    // =========================================================================

    /// Most recent administrative actions
    pub async fn list_user_activities(
        &self,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<UserActivityDto>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_activities")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, UserActivity>(
            r#"
            SELECT * FROM user_activities
            ORDER BY created_at DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(pagination.offset(ADMIN_PAGE_SIZE))
        .bind(pagination.limit(ADMIN_PAGE_SIZE))
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|r| r.into()).collect(), total))
    }

    async fn log_admin_action(
        &self,
        admin_id: Uuid,
        action: &str,
        description: &str,
        ip_address: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_activities (user_id, action, description, ip_address)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(admin_id)
        .bind(action)
        .bind(description)
        .bind(ip_address)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record admin action {}: {:?}", action, e);
            AppError::Database(e)
        })?;

        Ok(())
    }
}
