use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use super::{FileRecordStore, GrantStore, UserStore};
use crate::core::error::Result;
use crate::features::access::models::{
    FileRecord, Grant, PermissionLevel, Principal, UserRole, Visibility,
};

/// In-memory implementation of all three store contracts
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, Principal>>,
    files: RwLock<HashMap<Uuid, FileRecord>>,
    grants: RwLock<HashMap<(Uuid, Uuid), Grant>>,
    grant_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, email: &str, role: UserRole) -> Principal {
        let principal = Principal {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
            is_verified: true,
            is_active: true,
        };
        self.users
            .write()
            .unwrap()
            .insert(principal.id, principal.clone());
        principal
    }

    pub fn put_user(&self, principal: Principal) {
        self.users.write().unwrap().insert(principal.id, principal);
    }

    pub fn add_file(&self, owner: &Principal, visibility: Visibility) -> FileRecord {
        let file = FileRecord {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            visibility,
            file_size: 1024,
            file_type: ".pdf".to_string(),
        };
        self.files.write().unwrap().insert(file.id, file.clone());
        file
    }

    /// Insert or overwrite the grant for `(file, user)`
    pub fn grant(
        &self,
        file: &FileRecord,
        user: &Principal,
        permission: PermissionLevel,
        expires_at: Option<DateTime<Utc>>,
    ) -> Grant {
        let grant = Grant {
            id: Uuid::new_v4(),
            file_id: file.id,
            user_id: user.id,
            permission,
            granted_by: file.owner_id,
            granted_at: Utc::now(),
            expires_at,
        };
        self.grants
            .write()
            .unwrap()
            .insert((file.id, user.id), grant.clone());
        grant
    }

    pub fn grant_lookups(&self) -> usize {
        self.grant_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Principal>> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl FileRecordStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>> {
        Ok(self.files.read().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn find(&self, file_id: Uuid, user_id: Uuid) -> Result<Option<Grant>> {
        self.grant_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .grants
            .read()
            .unwrap()
            .get(&(file_id, user_id))
            .cloned())
    }
}
