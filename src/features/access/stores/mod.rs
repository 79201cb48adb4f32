//! Read contracts the access check consumes, with their Postgres adapters.

mod postgres;

#[cfg(test)]
mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::access::models::{FileRecord, Grant, Principal};

pub use postgres::{PgFileRecordStore, PgGrantStore, PgUserStore};

#[cfg(test)]
pub use memory::MemoryStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Principal>>;
}

#[async_trait]
pub trait FileRecordStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>>;
}

#[async_trait]
pub trait GrantStore: Send + Sync {
    /// The grant for `(file_id, user_id)`, expired or not
    async fn find(&self, file_id: Uuid, user_id: Uuid) -> Result<Option<Grant>>;
}
