use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::models::Visibility;
use crate::features::access::AccessService;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{GrantResponseDto, ShareFileDto};
use crate::features::files::models::{FileAction, GrantWithUser};
use crate::features::files::services::{fetch_file, ActivityService};
use crate::shared::clock::Clock;

const GRANT_SELECT: &str = r#"
    SELECT fa.id, fa.file_id, fa.user_id, fa.permission, fa.granted_by, fa.granted_at, fa.expires_at,
           u.email AS user_email,
           u.username AS user_username,
           u.first_name AS user_first_name,
           u.last_name AS user_last_name
    FROM file_access fa
    JOIN users u ON u.id = fa.user_id
"#;

/// Per-user grants on restricted files
pub struct ShareService {
    pool: PgPool,
    access: Arc<AccessService>,
    activity: Arc<ActivityService>,
    clock: Arc<dyn Clock>,
}

impl ShareService {
    pub fn new(
        pool: PgPool,
        access: Arc<AccessService>,
        activity: Arc<ActivityService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pool,
            access,
            activity,
            clock,
        }
    }

    /// Grant or re-grant `dto.user_email` access; the first granter is kept
    pub async fn share(
        &self,
        owner: &AuthenticatedUser,
        file_id: Uuid,
        dto: ShareFileDto,
        ip_address: Option<&str>,
    ) -> Result<GrantResponseDto> {
        if let Some(expires_at) = dto.expires_at {
            if expires_at <= self.clock.now() {
                return Err(AppError::Validation(
                    "Expiry must be in the future.".to_string(),
                ));
            }
        }

        let target_email = dto.user_email.trim();
        if target_email.eq_ignore_ascii_case(&owner.email) {
            return Err(Self::self_share());
        }

        let record = self.access.file(file_id).await?;
        if record.owner_id != owner.user_id {
            return Err(AppError::Forbidden(
                "Only the file owner can share this file.".to_string(),
            ));
        }

        if record.visibility != Visibility::Restricted {
            return Err(AppError::BadRequest(
                "Only restricted files can be shared with specific users.".to_string(),
            ));
        }

        let target_id: Uuid = sqlx::query_scalar(
            "SELECT id FROM users WHERE LOWER(email) = LOWER($1) AND is_verified = TRUE",
        )
        .bind(target_email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found or not verified.".to_string()))?;

        if target_id == owner.user_id {
            return Err(Self::self_share());
        }

        let grant_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO file_access (file_id, user_id, permission, granted_by, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (file_id, user_id) DO UPDATE
            SET permission = EXCLUDED.permission,
                expires_at = EXCLUDED.expires_at
            RETURNING id
            "#,
        )
        .bind(file_id)
        .bind(target_id)
        .bind(dto.permission)
        .bind(owner.user_id)
        .bind(dto.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to share file {}: {:?}", file_id, e);
            AppError::Database(e)
        })?;

        let file = fetch_file(&self.pool, file_id).await?;
        self.activity
            .log(
                Some(file_id),
                &file.name,
                owner.user_id,
                FileAction::Share,
                ip_address,
            )
            .await?;

        tracing::info!(
            "File shared: file={}, with={}, permission={}",
            file_id,
            target_id,
            dto.permission
        );

        self.get(grant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Access grant not found".to_string()))
    }

    pub async fn list_grants(&self, owner_id: Uuid, file_id: Uuid) -> Result<Vec<GrantResponseDto>> {
        let record = self.access.file(file_id).await?;
        if record.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the file owner can view who has access.".to_string(),
            ));
        }

        self.grants_for_file(file_id).await
    }

    pub async fn grants_for_file(&self, file_id: Uuid) -> Result<Vec<GrantResponseDto>> {
        let query = format!("{} WHERE fa.file_id = $1 ORDER BY fa.granted_at DESC", GRANT_SELECT);
        let now = self.clock.now();

        let rows = sqlx::query_as::<_, GrantWithUser>(&query)
            .bind(file_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| GrantResponseDto::from_row(r, now))
            .collect())
    }

    async fn get(&self, grant_id: Uuid) -> Result<Option<GrantResponseDto>> {
        let query = format!("{} WHERE fa.id = $1", GRANT_SELECT);

        let row = sqlx::query_as::<_, GrantWithUser>(&query)
            .bind(grant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| GrantResponseDto::from_row(r, self.clock.now())))
    }

    /// Revoke a grant; only the owner of the grant's file may
    pub async fn remove_access(&self, user_id: Uuid, grant_id: Uuid) -> Result<()> {
        let owner_id: Uuid = sqlx::query_scalar(
            r#"
            SELECT f.owner_id
            FROM file_access fa
            JOIN files f ON f.id = fa.file_id
            WHERE fa.id = $1
            "#,
        )
        .bind(grant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Access grant not found".to_string()))?;

        if owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only the file owner can remove access.".to_string(),
            ));
        }

        sqlx::query("DELETE FROM file_access WHERE id = $1")
            .bind(grant_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Access removed: grant={}, by={}", grant_id, user_id);
        Ok(())
    }

    fn self_share() -> AppError {
        AppError::BadRequest("You cannot share a file with yourself.".to_string())
    }
}
