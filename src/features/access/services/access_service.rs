use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::decider::{AccessDecider, Decision};
use crate::features::access::dtos::FilePermissionsDto;
use crate::features::access::models::{FileRecord, Operation, Principal};
use crate::features::access::stores::{FileRecordStore, GrantStore, UserStore};
use crate::shared::clock::Clock;

/// Resolves ids, runs the decider and turns denials into errors
pub struct AccessService {
    users: Arc<dyn UserStore>,
    files: Arc<dyn FileRecordStore>,
    decider: AccessDecider,
}

impl AccessService {
    pub fn new(
        users: Arc<dyn UserStore>,
        files: Arc<dyn FileRecordStore>,
        grants: Arc<dyn GrantStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            files,
            decider: AccessDecider::new(grants, clock),
        }
    }

    /// The file's access record, `NotFound` when it does not exist
    pub async fn file(&self, file_id: Uuid) -> Result<FileRecord> {
        self.files
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    async fn resolve(&self, user_id: Uuid, file_id: Uuid) -> Result<(Principal, FileRecord)> {
        let file = self.file(file_id).await?;

        let principal = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok((principal, file))
    }

    /// The file record when `operation` is allowed, `Forbidden` otherwise
    pub async fn authorize(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        operation: Operation,
    ) -> Result<FileRecord> {
        let (principal, file) = self.resolve(user_id, file_id).await?;

        match self.decider.decide(&principal, &file, operation).await? {
            Decision::Allow => Ok(file),
            Decision::Deny => Err(self.deny(operation, &principal, &file)),
        }
    }

    /// Like [`authorize`](Self::authorize), also reporting every allowed
    /// operation. Both answers come from the same grant read.
    pub async fn authorize_with_permissions(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        operation: Operation,
    ) -> Result<(FileRecord, FilePermissionsDto)> {
        let (principal, file) = self.resolve(user_id, file_id).await?;
        let standing = self.decider.standing(&principal, &file).await?;

        if !standing.permits(operation).is_allowed() {
            return Err(self.deny(operation, &principal, &file));
        }

        let permissions = FilePermissionsDto::new(
            file.id,
            file.owner_id == principal.id,
            AccessDecider::operations_for(standing),
        );
        Ok((file, permissions))
    }

    pub async fn permissions(&self, user_id: Uuid, file_id: Uuid) -> Result<FilePermissionsDto> {
        let (principal, file) = self.resolve(user_id, file_id).await?;
        let operations = self.decider.allowed_operations(&principal, &file).await?;

        Ok(FilePermissionsDto::new(
            file.id,
            file.owner_id == principal.id,
            operations,
        ))
    }

    fn deny(&self, operation: Operation, principal: &Principal, file: &FileRecord) -> AppError {
        tracing::debug!(
            "Denied {} on file {} for user {}",
            operation.verb(),
            file.id,
            principal.id
        );
        Self::denied(operation)
    }

    pub fn denied(operation: Operation) -> AppError {
        AppError::Forbidden(format!(
            "You do not have permission to {} this file.",
            operation.verb()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::models::{PermissionLevel, UserRole, Visibility};
    use crate::features::access::stores::MemoryStore;
    use crate::shared::clock::SystemClock;

    fn service(store: &Arc<MemoryStore>) -> AccessService {
        AccessService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn test_unknown_file_or_user_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let owner = store.add_user("owner@example.com", UserRole::User);
        let file = store.add_file(&owner, Visibility::Public);

        let missing_file = service
            .authorize(owner.id, Uuid::new_v4(), Operation::View)
            .await;
        assert!(matches!(missing_file, Err(AppError::NotFound(_))));

        let missing_user = service
            .authorize(Uuid::new_v4(), file.id, Operation::View)
            .await;
        assert!(matches!(missing_user, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_authorize_maps_deny_to_forbidden() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let owner = store.add_user("owner@example.com", UserRole::User);
        let reader = store.add_user("reader@example.com", UserRole::User);
        let file = store.add_file(&owner, Visibility::Restricted);
        store.grant(&file, &reader, PermissionLevel::View, None);

        let record = service
            .authorize(reader.id, file.id, Operation::View)
            .await
            .unwrap();
        assert_eq!(record.id, file.id);

        match service.authorize(reader.id, file.id, Operation::Download).await {
            Err(AppError::Forbidden(msg)) => {
                assert_eq!(msg, "You do not have permission to download this file.")
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_role_does_not_bypass_file_rules() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let owner = store.add_user("owner@example.com", UserRole::User);
        let admin = store.add_user("admin@example.com", UserRole::Admin);
        let file = store.add_file(&owner, Visibility::Private);

        let denied = service.authorize(admin.id, file.id, Operation::View).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_permissions_summary() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let owner = store.add_user("owner@example.com", UserRole::User);
        let other = store.add_user("other@example.com", UserRole::User);
        let file = store.add_file(&owner, Visibility::Public);

        let summary = service.permissions(other.id, file.id).await.unwrap();
        assert!(!summary.is_owner);
        assert!(summary.can_view && summary.can_download && !summary.can_edit);

        let summary = service.permissions(owner.id, file.id).await.unwrap();
        assert!(summary.is_owner && summary.can_edit);
    }

    #[tokio::test]
    async fn test_authorize_with_permissions_reads_grant_once() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let owner = store.add_user("owner@example.com", UserRole::User);
        let guest = store.add_user("guest@example.com", UserRole::User);
        let file = store.add_file(&owner, Visibility::Restricted);
        store.grant(&file, &guest, PermissionLevel::Download, None);

        let (record, permissions) = service
            .authorize_with_permissions(guest.id, file.id, Operation::View)
            .await
            .unwrap();

        assert_eq!(record.id, file.id);
        assert_eq!(
            permissions.operations,
            vec![Operation::View, Operation::Download]
        );
        assert!(!permissions.is_owner);
        assert_eq!(store.grant_lookups(), 1);
    }

    #[tokio::test]
    async fn test_authorize_with_permissions_denies_without_grant() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let owner = store.add_user("owner@example.com", UserRole::User);
        let guest = store.add_user("guest@example.com", UserRole::User);
        let file = store.add_file(&owner, Visibility::Restricted);

        let result = service
            .authorize_with_permissions(guest.id, file.id, Operation::View)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(store.grant_lookups(), 1);
    }
}
