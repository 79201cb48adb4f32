use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::settings::dtos::{SettingResponseDto, UpdateSettingDto};
use crate::features::settings::models::SystemSetting;
use crate::shared::constants::SETTING_PUBLIC_FILE_BROWSING;

const KEY_MAX_LEN: usize = 100;

pub struct SettingsService {
    pool: PgPool,
}

impl SettingsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<SettingResponseDto>> {
        let settings = sqlx::query_as::<_, SystemSetting>(
            "SELECT * FROM system_settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list system settings: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(settings.into_iter().map(|s| s.into()).collect())
    }

    pub async fn get(&self, key: &str) -> Result<Option<SystemSetting>> {
        sqlx::query_as::<_, SystemSetting>("SELECT * FROM system_settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load setting {}: {:?}", key, e);
                AppError::Database(e)
            })
    }

    /// Whether users may browse other users' public files (on when unset)
    pub async fn is_public_browsing_enabled(&self) -> Result<bool> {
        Ok(self
            .get(SETTING_PUBLIC_FILE_BROWSING)
            .await?
            .map(|s| s.is_enabled())
            .unwrap_or(true))
    }

    /// Create the setting or overwrite its value
    pub async fn upsert(
        &self,
        key: &str,
        dto: UpdateSettingDto,
        updated_by: Uuid,
    ) -> Result<SettingResponseDto> {
        let key = key.trim();
        if key.is_empty() || key.len() > KEY_MAX_LEN {
            return Err(AppError::Validation(format!(
                "Setting key must be 1-{} characters",
                KEY_MAX_LEN
            )));
        }

        let setting = sqlx::query_as::<_, SystemSetting>(
            r#"
            INSERT INTO system_settings (key, value, description, updated_by)
            VALUES ($1, $2, COALESCE($3, ''), $4)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                description = COALESCE($3, system_settings.description),
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(&dto.value)
        .bind(dto.description.as_deref())
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update setting {}: {:?}", key, e);
            AppError::Database(e)
        })?;

        tracing::info!("Setting updated: key={}, by={}", setting.key, updated_by);

        Ok(setting.into())
    }
}
