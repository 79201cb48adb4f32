use sqlx::FromRow;
use uuid::Uuid;

use super::Visibility;

/// The slice of file metadata the access check reads
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub visibility: Visibility,
    pub file_size: i64,
    pub file_type: String,
}
