use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::settings::models::SystemSetting;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingResponseDto {
    pub id: Uuid,
    pub key: String,
    pub value: String,
    pub description: String,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<SystemSetting> for SettingResponseDto {
    fn from(s: SystemSetting) -> Self {
        Self {
            id: s.id,
            key: s.key,
            value: s.value,
            description: s.description,
            updated_by: s.updated_by,
            updated_at: s.updated_at,
        }
    }
}

/// Request DTO for creating or updating a setting
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingDto {
    #[validate(length(max = 10000, message = "Value must be at most 10000 characters"))]
    pub value: String,

    /// Left unchanged when omitted
    pub description: Option<String>,
}
