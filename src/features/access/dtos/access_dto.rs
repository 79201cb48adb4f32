use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::access::models::Operation;

/// What the caller may do with one file
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FilePermissionsDto {
    pub file_id: Uuid,
    pub is_owner: bool,
    pub can_view: bool,
    pub can_download: bool,
    pub can_edit: bool,
    /// Allowed operations, in `view`, `download`, `edit` order
    pub operations: Vec<Operation>,
}

impl FilePermissionsDto {
    pub fn new(file_id: Uuid, is_owner: bool, operations: Vec<Operation>) -> Self {
        Self {
            file_id,
            is_owner,
            can_view: operations.contains(&Operation::View),
            can_download: operations.contains(&Operation::Download),
            can_edit: operations.contains(&Operation::Edit),
            operations,
        }
    }
}
