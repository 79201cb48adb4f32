//! MinIO/S3-compatible storage client
//!
//! All objects are private; downloads are streamed through the API after
//! the access check, never served from the bucket directly.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::ObjectStorage;
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    prefix: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration and make sure the bucket exists
    pub async fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            prefix: config.prefix.trim_matches('/').to_string(),
        };

        client.ensure_bucket_exists().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, prefix: {}",
            client.endpoint,
            client.bucket.name(),
            client.prefix
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        // Creating an existing bucket fails; that case is fine
        match self.create_bucket().await {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    async fn create_bucket(&self) -> Result<()> {
        Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        Ok(())
    }

    /// Object key inside the bucket for an application storage key
    pub fn object_key(&self, key: &str) -> String {
        object_key(&self.prefix, key)
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

fn object_key(prefix: &str, key: &str) -> String {
    let key = key.trim_start_matches('/');
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}

#[async_trait]
impl ObjectStorage for MinIOClient {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let object_key = self.object_key(key);

        self.bucket
            .put_object_with_content_type(&object_key, &data, content_type)
            .await
            .map_err(|e| {
                AppError::Internal(format!("Failed to upload file '{}': {}", object_key, e))
            })?;

        debug!(
            "Uploaded file '{}' to bucket '{}'",
            object_key,
            self.bucket.name()
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let object_key = self.object_key(key);

        let response = self.bucket.get_object(&object_key).await.map_err(|e| {
            let error_str = e.to_string();
            if error_str.contains("404") || error_str.contains("NoSuchKey") {
                AppError::NotFound("Stored file content not found".to_string())
            } else {
                AppError::Internal(format!("Failed to download file '{}': {}", object_key, e))
            }
        })?;

        if response.status_code() == 404 {
            return Err(AppError::NotFound(
                "Stored file content not found".to_string(),
            ));
        }

        debug!(
            "Downloaded file '{}' from bucket '{}'",
            object_key,
            self.bucket.name()
        );
        Ok(response.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let object_key = self.object_key(key);

        self.bucket.delete_object(&object_key).await.map_err(|e| {
            AppError::Internal(format!("Failed to delete file '{}': {}", object_key, e))
        })?;

        debug!(
            "Deleted file '{}' from bucket '{}'",
            object_key,
            self.bucket.name()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_joins_prefix() {
        assert_eq!(
            object_key("files", "uploads/user_1/a.pdf"),
            "files/uploads/user_1/a.pdf"
        );
        assert_eq!(object_key("", "/uploads/a.pdf"), "uploads/a.pdf");
    }
}
