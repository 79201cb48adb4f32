use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// What a user did to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "file_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Upload,
    View,
    Download,
    Update,
    Delete,
    Share,
}

impl std::fmt::Display for FileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileAction::Upload => "upload",
            FileAction::View => "view",
            FileAction::Download => "download",
            FileAction::Update => "update",
            FileAction::Delete => "delete",
            FileAction::Share => "share",
        };
        write!(f, "{}", s)
    }
}

/// Activity log row; `file_id` is cleared when the file is deleted
#[derive(Debug, Clone, FromRow)]
pub struct FileActivity {
    pub id: Uuid,
    pub file_id: Option<Uuid>,
    pub file_name: String,
    pub user_id: Uuid,
    pub action: FileAction,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Activity joined with the acting user
#[derive(Debug, Clone, FromRow)]
pub struct FileActivityWithUser {
    #[sqlx(flatten)]
    pub activity: FileActivity,
    pub username: String,
}
