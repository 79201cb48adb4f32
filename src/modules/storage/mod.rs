//! Storage module for file content
//!
//! File bytes live behind the [`ObjectStorage`] trait. Metadata stays in
//! Postgres; only the storage key links the two.

mod local_storage;
mod minio_client;

use async_trait::async_trait;

use crate::core::error::Result;

pub use local_storage::LocalStorage;
pub use minio_client::MinIOClient;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key`, replacing any previous object
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Fetch the object stored under `key`
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove the object under `key`. Removing a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}
