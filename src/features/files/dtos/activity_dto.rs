use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::files::models::{FileAction, FileActivityWithUser};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileActivityDto {
    pub id: Uuid,
    /// Null once the file has been deleted
    pub file_id: Option<Uuid>,
    pub file_name: String,
    pub user_id: Uuid,
    pub username: String,
    pub action: FileAction,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FileActivityWithUser> for FileActivityDto {
    fn from(row: FileActivityWithUser) -> Self {
        let a = row.activity;
        Self {
            id: a.id,
            file_id: a.file_id,
            file_name: a.file_name,
            user_id: a.user_id,
            username: row.username,
            action: a.action,
            ip_address: a.ip_address,
            created_at: a.created_at,
        }
    }
}
