use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::access::models::Visibility;

/// Database model for uploaded files
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub storage_key: String,
    pub original_filename: String,
    pub content_type: String,
    pub owner_id: Uuid,
    pub category_id: Option<Uuid>,
    pub visibility: Visibility,
    pub file_size: i64,
    /// Lowercased extension including the dot, e.g. `.pdf`
    pub file_type: String,
    pub is_favorite: bool,
    pub download_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Attachment name offered on download
    pub fn download_name(&self) -> String {
        format!("{}{}", self.name, self.file_type)
    }
}

/// File row joined with its category and owner
#[derive(Debug, Clone, FromRow)]
pub struct FileWithMeta {
    #[sqlx(flatten)]
    pub file: File,
    pub category_name: Option<String>,
    pub owner_username: String,
    pub owner_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_name_appends_extension() {
        let now = Utc::now();
        let file = File {
            id: Uuid::new_v4(),
            name: "Quarterly report".to_string(),
            description: String::new(),
            storage_key: "uploads/user_1/x.pdf".to_string(),
            original_filename: "q3.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            owner_id: Uuid::new_v4(),
            category_id: None,
            visibility: Visibility::Restricted,
            file_size: 2048,
            file_type: ".pdf".to_string(),
            is_favorite: false,
            download_count: 0,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(file.download_name(), "Quarterly report.pdf");
    }
}
