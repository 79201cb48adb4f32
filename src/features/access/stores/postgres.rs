use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{FileRecordStore, GrantStore, UserStore};
use crate::core::error::{AppError, Result};
use crate::features::access::models::{FileRecord, Grant, Principal};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, id: Uuid) -> Result<Option<Principal>> {
        sqlx::query_as::<_, Principal>(
            r#"
            SELECT id, email, role, is_verified, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load principal {}: {:?}", id, e);
            AppError::Database(e)
        })
    }
}

pub struct PgFileRecordStore {
    pool: PgPool,
}

impl PgFileRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRecordStore for PgFileRecordStore {
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, owner_id, visibility, file_size, file_type
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load file record {}: {:?}", id, e);
            AppError::Database(e)
        })
    }
}

pub struct PgGrantStore {
    pool: PgPool,
}

impl PgGrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantStore for PgGrantStore {
    async fn find(&self, file_id: Uuid, user_id: Uuid) -> Result<Option<Grant>> {
        sqlx::query_as::<_, Grant>(
            r#"
            SELECT id, file_id, user_id, permission, granted_by, granted_at, expires_at
            FROM file_access
            WHERE file_id = $1 AND user_id = $2
            "#,
        )
        .bind(file_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to load grant for file {} user {}: {:?}",
                file_id,
                user_id,
                e
            );
            AppError::Database(e)
        })
    }
}
