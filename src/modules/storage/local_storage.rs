//! Filesystem-backed object storage
//!
//! Keys are relative paths below a root directory. Any key that could escape
//! the root (absolute paths, `..`, prefixes) is rejected before touching disk.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::ObjectStorage;
use crate::core::error::{AppError, Result};

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if needed
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create storage root '{}': {}",
                self.root.display(),
                e
            ))
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let mut path = self.root.clone();
        let mut depth = 0usize;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(AppError::BadRequest(format!(
                        "Invalid storage key '{}'",
                        key
                    )));
                }
            }
        }

        if depth == 0 {
            return Err(AppError::BadRequest("Storage key is empty".to_string()));
        }

        Ok(path)
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Internal(format!("Failed to create directory for '{}': {}", key, e))
            })?;
        }

        let size = data.len();
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file '{}': {}", key, e)))?;

        debug!("Stored '{}' ({} bytes) at {}", key, size, path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::NotFound("Stored file content not found".to_string()),
            _ => AppError::Internal(format!("Failed to read file '{}': {}", key, e)),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted '{}' from {}", key, path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("'{}' already absent from local storage", key);
                Ok(())
            }
            Err(e) => Err(AppError::Internal(format!(
                "Failed to delete file '{}': {}",
                key, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = "uploads/user_1/report.pdf";

        storage
            .put(key, b"%PDF-1.4".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert!(dir.path().join(key).exists());
        assert_eq!(storage.get(key).await.unwrap(), b"%PDF-1.4".to_vec());

        storage.delete(key).await.unwrap();
        assert!(matches!(
            storage.get(key).await,
            Err(AppError::NotFound(_))
        ));

        // Deleting twice is fine
        storage.delete(key).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_keys_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("media"));

        for key in ["../escape.txt", "uploads/../../escape.txt", "/etc/passwd", ""] {
            let result = storage.put(key, b"x".to_vec(), "text/plain").await;
            assert!(
                matches!(result, Err(AppError::BadRequest(_))),
                "key {:?} should be rejected",
                key
            );
        }

        assert!(!dir.path().join("escape.txt").exists());
    }
}
