use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::FileActivityDto;
use crate::features::files::models::{FileAction, FileActivityWithUser};

const ACTIVITY_SELECT: &str = r#"
    SELECT a.id, a.file_id, a.file_name, a.user_id, a.action, a.ip_address, a.created_at,
           u.username
    FROM file_activities a
    JOIN users u ON u.id = a.user_id
"#;

/// Append-only log of file actions
pub struct ActivityService {
    pool: PgPool,
}

impl ActivityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn log(
        &self,
        file_id: Option<Uuid>,
        file_name: &str,
        user_id: Uuid,
        action: FileAction,
        ip_address: Option<&str>,
    ) -> Result<()> {
        self.log_with(&self.pool, file_id, file_name, user_id, action, ip_address)
            .await
    }

    /// Record an activity on `executor`, e.g. inside the caller's transaction
    pub async fn log_with<'e, E>(
        &self,
        executor: E,
        file_id: Option<Uuid>,
        file_name: &str,
        user_id: Uuid,
        action: FileAction,
        ip_address: Option<&str>,
    ) -> Result<()>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO file_activities (file_id, file_name, user_id, action, ip_address)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(file_id)
        .bind(file_name)
        .bind(user_id)
        .bind(action)
        .bind(ip_address)
        .execute(executor)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to record {} activity for user {}: {:?}",
                action,
                user_id,
                e
            );
            AppError::Database(e)
        })?;

        tracing::debug!("Activity: user={} action={} file={:?}", user_id, action, file_id);
        Ok(())
    }

    /// Most recent activities by one user
    pub async fn recent_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<FileActivityDto>> {
        let query = format!(
            "{} WHERE a.user_id = $1 ORDER BY a.created_at DESC LIMIT $2",
            ACTIVITY_SELECT
        );

        let rows = sqlx::query_as::<_, FileActivityWithUser>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Most recent activities across all users
    pub async fn recent(&self, limit: i64) -> Result<Vec<FileActivityDto>> {
        let query = format!("{} ORDER BY a.created_at DESC LIMIT $1", ACTIVITY_SELECT);

        let rows = sqlx::query_as::<_, FileActivityWithUser>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
