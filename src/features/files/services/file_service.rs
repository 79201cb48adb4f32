use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::models::{Operation, Visibility};
use crate::features::access::AccessService;
use crate::features::files::dtos::{
    allowed_file_type, default_display_name, storage_key, FavoriteDto, FileDetailDto,
    FileListQuery, FileResponseDto, FileStatsDto, MyFilesDto, NewUpload, PublicFilesDto,
    SharedFilesQuery, TypeGroup, UpdateFileDto,
};
use crate::features::files::models::{File, FileAction, FileWithMeta};
use crate::features::files::services::{ActivityService, ShareService};
use crate::features::settings::SettingsService;
use crate::modules::storage::ObjectStorage;
use crate::shared::clock::Clock;
use crate::shared::constants::FILES_PAGE_SIZE;
use crate::shared::format::{format_file_size, like_pattern};
use crate::shared::types::PaginationQuery;

pub(crate) const FILE_SELECT: &str = r#"
    SELECT f.*,
           c.name AS category_name,
           u.username AS owner_username,
           u.email AS owner_email
    FROM files f
    JOIN users u ON u.id = f.owner_id
    LEFT JOIN file_categories c ON c.id = f.category_id
"#;

const NAME_MAX_LEN: usize = 255;

/// Load a file row or fail with `NotFound`
pub async fn fetch_file(pool: &PgPool, file_id: Uuid) -> Result<File> {
    sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
        .bind(file_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load file {}: {:?}", file_id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))
}

/// Bytes and headers for a download
#[derive(Debug)]
pub struct FileDownload {
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Service for file operations
pub struct FileService {
    pool: PgPool,
    storage: Arc<dyn ObjectStorage>,
    access: Arc<AccessService>,
    shares: Arc<ShareService>,
    activity: Arc<ActivityService>,
    settings: Arc<SettingsService>,
    clock: Arc<dyn Clock>,
    max_upload_size: usize,
}

impl FileService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn ObjectStorage>,
        access: Arc<AccessService>,
        shares: Arc<ShareService>,
        activity: Arc<ActivityService>,
        settings: Arc<SettingsService>,
        clock: Arc<dyn Clock>,
        max_upload_size: usize,
    ) -> Self {
        Self {
            pool,
            storage,
            access,
            shares,
            activity,
            settings,
            clock,
            max_upload_size,
        }
    }

    pub fn max_upload_size(&self) -> usize {
        self.max_upload_size
    }

    pub fn ensure_within_limit(&self, size: usize) -> Result<()> {
        if size > self.max_upload_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File too large. Maximum size is {}",
                format_file_size(self.max_upload_size as i64)
            )));
        }
        Ok(())
    }

    async fn get_with_meta(&self, file_id: Uuid) -> Result<FileWithMeta> {
        let query = format!("{} WHERE f.id = $1", FILE_SELECT);
        sqlx::query_as::<_, FileWithMeta>(&query)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    /// The caller's own files, favorites first, with totals over all of them
    pub async fn list_my_files(
        &self,
        user_id: Uuid,
        query: &FileListQuery,
        pagination: &PaginationQuery,
    ) -> Result<(MyFilesDto, i64)> {
        let pattern = like_pattern(query.q.as_deref());
        let extensions = TypeGroup::extension_list(query.file_type);
        let favorites_only = query.favorites.unwrap_or(false);

        let filters = r#"
            WHERE f.owner_id = $1
              AND ($2::text IS NULL OR f.name ILIKE $2 OR f.description ILIKE $2)
              AND ($3::uuid IS NULL OR f.category_id = $3)
              AND ($4::text[] IS NULL OR f.file_type = ANY($4))
              AND (NOT $5::boolean OR f.is_favorite)
        "#;

        let count_query = format!("SELECT COUNT(*) FROM files f {}", filters);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(user_id)
            .bind(&pattern)
            .bind(query.category)
            .bind(&extensions)
            .bind(favorites_only)
            .fetch_one(&self.pool)
            .await?;

        let list_query = format!(
            "{} {} ORDER BY f.is_favorite DESC, f.created_at DESC OFFSET $6 LIMIT $7",
            FILE_SELECT, filters
        );
        let rows = sqlx::query_as::<_, FileWithMeta>(&list_query)
            .bind(user_id)
            .bind(&pattern)
            .bind(query.category)
            .bind(&extensions)
            .bind(favorites_only)
            .bind(pagination.offset(FILES_PAGE_SIZE))
            .bind(pagination.limit(FILES_PAGE_SIZE))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list files for user {}: {:?}", user_id, e);
                AppError::Database(e)
            })?;

        let stats = self.stats_for_owner(user_id).await?;

        Ok((
            MyFilesDto {
                files: rows.into_iter().map(|r| r.into()).collect(),
                stats,
            },
            total,
        ))
    }

    pub async fn stats_for_owner(&self, user_id: Uuid) -> Result<FileStatsDto> {
        let mut stats = sqlx::query_as::<_, FileStatsDto>(
            r#"
            SELECT COUNT(*) AS total_files,
                   COUNT(*) FILTER (WHERE is_favorite) AS favorite_files,
                   COUNT(*) FILTER (WHERE visibility IN ('public', 'restricted')) AS shared_files,
                   COALESCE(SUM(file_size), 0)::BIGINT AS total_size
            FROM files
            WHERE owner_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        stats.total_size_display = format_file_size(stats.total_size);
        Ok(stats)
    }

    /// Store the bytes, then the row; a failed insert removes the stored object
    pub async fn upload(
        &self,
        owner_id: Uuid,
        upload: NewUpload,
        ip_address: Option<&str>,
    ) -> Result<FileResponseDto> {
        if upload.data.is_empty() {
            return Err(AppError::Validation("The submitted file is empty.".to_string()));
        }
        self.ensure_within_limit(upload.data.len())?;

        let file_type = allowed_file_type(&upload.original_filename)?;

        let name = upload
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_display_name(&upload.original_filename));
        if name.chars().count() > NAME_MAX_LEN {
            return Err(AppError::Validation(format!(
                "Name must be at most {} characters",
                NAME_MAX_LEN
            )));
        }

        let file_id = Uuid::new_v4();
        let key = storage_key(owner_id, file_id, &file_type);
        let file_size = upload.data.len() as i64;

        self.storage
            .put(&key, upload.data, &upload.content_type)
            .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO files (id, name, description, storage_key, original_filename, content_type,
                               owner_id, category_id, visibility, file_size, file_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(file_id)
        .bind(&name)
        .bind(upload.description.as_deref().unwrap_or("").trim())
        .bind(&key)
        .bind(&upload.original_filename)
        .bind(&upload.content_type)
        .bind(owner_id)
        .bind(upload.category_id)
        .bind(upload.visibility)
        .bind(file_size)
        .bind(&file_type)
        .execute(&self.pool)
        .await;

        if let Err(e) = inserted {
            if let Err(cleanup) = self.storage.delete(&key).await {
                warn!("Failed to remove orphaned object '{}': {}", key, cleanup);
            }
            return Err(AppError::from_db(e, "File already exists."));
        }

        self.activity
            .log(Some(file_id), &name, owner_id, FileAction::Upload, ip_address)
            .await?;

        info!(
            "File uploaded: id={}, owner={}, size={}, type={}",
            file_id, owner_id, file_size, file_type
        );

        Ok(self.get_with_meta(file_id).await?.into())
    }

    pub async fn view(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        ip_address: Option<&str>,
    ) -> Result<FileDetailDto> {
        let (_, permissions) = self
            .access
            .authorize_with_permissions(user_id, file_id, Operation::View)
            .await?;

        let row = self.get_with_meta(file_id).await?;

        self.activity
            .log(Some(file_id), &row.file.name, user_id, FileAction::View, ip_address)
            .await?;

        let shared_with = if permissions.is_owner {
            Some(self.shares.grants_for_file(file_id).await?)
        } else {
            None
        };

        Ok(FileDetailDto {
            file: row.into(),
            is_owner: permissions.is_owner,
            operations: permissions.operations,
            shared_with,
        })
    }

    pub async fn download(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        ip_address: Option<&str>,
    ) -> Result<FileDownload> {
        self.access
            .authorize(user_id, file_id, Operation::Download)
            .await?;

        let file = fetch_file(&self.pool, file_id).await?;
        let data = self.storage.get(&file.storage_key).await?;

        sqlx::query("UPDATE files SET download_count = download_count + 1 WHERE id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        self.activity
            .log(Some(file_id), &file.name, user_id, FileAction::Download, ip_address)
            .await?;

        debug!("File downloaded: id={}, by={}", file_id, user_id);

        Ok(FileDownload {
            filename: file.download_name(),
            content_type: file.content_type,
            data,
        })
    }

    /// Edit metadata; visibility and category stay with the owner
    pub async fn update(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        dto: UpdateFileDto,
        ip_address: Option<&str>,
    ) -> Result<FileResponseDto> {
        let record = self
            .access
            .authorize(user_id, file_id, Operation::Edit)
            .await?;

        if dto.touches_owner_fields() && record.owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only the file owner can change visibility or category.".to_string(),
            ));
        }

        let name = dto.name.as_deref().map(str::trim);
        if name == Some("") {
            return Err(AppError::Validation("Name cannot be blank".to_string()));
        }

        let updated = sqlx::query_as::<_, File>(
            r#"
            UPDATE files
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                category_id = CASE WHEN $4::boolean THEN $5::uuid ELSE category_id END,
                visibility = COALESCE($6, visibility),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(file_id)
        .bind(name)
        .bind(dto.description.as_deref().map(str::trim))
        .bind(dto.category_id.is_some())
        .bind(dto.category_id.flatten())
        .bind(dto.visibility)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_db(e, "File already exists."))?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        self.activity
            .log(Some(file_id), &updated.name, user_id, FileAction::Update, ip_address)
            .await?;

        info!("File updated: id={}, by={}", file_id, user_id);

        Ok(self.get_with_meta(file_id).await?.into())
    }

    pub async fn delete(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        ip_address: Option<&str>,
    ) -> Result<()> {
        let file = fetch_file(&self.pool, file_id).await?;
        if file.owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only the file owner can delete this file.".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        self.activity
            .log_with(
                &mut *tx,
                Some(file_id),
                &file.name,
                user_id,
                FileAction::Delete,
                ip_address,
            )
            .await?;
        Self::delete_row(&mut tx, &file).await?;
        tx.commit().await?;

        self.discard_object(&file).await;
        info!("File deleted: id={}, owner={}", file.id, file.owner_id);
        Ok(())
    }

    /// Remove the row, then the stored object; no ownership check
    pub async fn remove(&self, file: &File) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::delete_row(&mut tx, file).await?;
        tx.commit().await?;

        self.discard_object(file).await;
        info!("File removed: id={}, owner={}", file.id, file.owner_id);
        Ok(())
    }

    async fn delete_row(tx: &mut Transaction<'_, Postgres>, file: &File) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(file.id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete file {}: {:?}", file.id, e);
                AppError::Database(e)
            })?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound("File not found".to_string()));
        }
        Ok(())
    }

    /// Runs after the row is gone; a failure only leaves an orphaned object
    async fn discard_object(&self, file: &File) {
        if let Err(e) = self.storage.delete(&file.storage_key).await {
            warn!(
                "Orphaned object '{}' after deleting file {}: {}",
                file.storage_key, file.id, e
            );
        }
    }

    pub async fn toggle_favorite(&self, user_id: Uuid, file_id: Uuid) -> Result<FavoriteDto> {
        let file = fetch_file(&self.pool, file_id).await?;
        if file.owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only the file owner can favorite this file.".to_string(),
            ));
        }

        let is_favorite: bool = sqlx::query_scalar(
            r#"
            UPDATE files SET is_favorite = NOT is_favorite
            WHERE id = $1
            RETURNING is_favorite
            "#,
        )
        .bind(file_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(FavoriteDto {
            id: file_id,
            is_favorite,
        })
    }

    /// Files the caller holds a live grant on, newest first
    pub async fn shared_with_me(
        &self,
        user_id: Uuid,
        query: &SharedFilesQuery,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<FileResponseDto>, i64)> {
        let pattern = like_pattern(query.q.as_deref());
        let now = self.clock.now();

        let filters = r#"
            JOIN file_access fa ON fa.file_id = f.id
            WHERE fa.user_id = $1
              AND (fa.expires_at IS NULL OR fa.expires_at > $2)
              AND ($3::text IS NULL OR f.name ILIKE $3 OR f.description ILIKE $3)
        "#;

        let count_query = format!("SELECT COUNT(*) FROM files f {}", filters);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(user_id)
            .bind(now)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let list_query = format!(
            "{} {} ORDER BY f.created_at DESC OFFSET $4 LIMIT $5",
            FILE_SELECT, filters
        );
        let rows = sqlx::query_as::<_, FileWithMeta>(&list_query)
            .bind(user_id)
            .bind(now)
            .bind(&pattern)
            .bind(pagination.offset(FILES_PAGE_SIZE))
            .bind(pagination.limit(FILES_PAGE_SIZE))
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(|r| r.into()).collect(), total))
    }

    /// Other users' public files, when browsing is enabled
    pub async fn public_files(
        &self,
        user_id: Uuid,
        query: &FileListQuery,
        pagination: &PaginationQuery,
    ) -> Result<(PublicFilesDto, i64)> {
        if !self.settings.is_public_browsing_enabled().await? {
            return Err(AppError::Forbidden(
                "Public file browsing is disabled.".to_string(),
            ));
        }

        let pattern = like_pattern(query.q.as_deref());
        let extensions = TypeGroup::extension_list(query.file_type);

        let filters = r#"
            WHERE f.visibility = 'public'
              AND f.owner_id <> $1
              AND ($2::text IS NULL OR f.name ILIKE $2 OR f.description ILIKE $2)
              AND ($3::uuid IS NULL OR f.category_id = $3)
              AND ($4::text[] IS NULL OR f.file_type = ANY($4))
        "#;

        let count_query = format!("SELECT COUNT(*) FROM files f {}", filters);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(user_id)
            .bind(&pattern)
            .bind(query.category)
            .bind(&extensions)
            .fetch_one(&self.pool)
            .await?;

        let list_query = format!(
            "{} {} ORDER BY f.created_at DESC OFFSET $5 LIMIT $6",
            FILE_SELECT, filters
        );
        let rows = sqlx::query_as::<_, FileWithMeta>(&list_query)
            .bind(user_id)
            .bind(&pattern)
            .bind(query.category)
            .bind(&extensions)
            .bind(pagination.offset(FILES_PAGE_SIZE))
            .bind(pagination.limit(FILES_PAGE_SIZE))
            .fetch_all(&self.pool)
            .await?;

        let total_public_files: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM files WHERE visibility = $1 AND owner_id <> $2",
        )
        .bind(Visibility::Public)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((
            PublicFilesDto {
                files: rows.into_iter().map(|r| r.into()).collect(),
                total_public_files,
            },
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::stores::MemoryStore;
    use crate::shared::clock::SystemClock;
    use async_trait::async_trait;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Mutex;

    /// Records deletions; `fail_deletes` makes every delete error
    #[derive(Default)]
    struct RecordingStorage {
        deleted: Mutex<Vec<String>>,
        fail_deletes: bool,
    }

    #[async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn put(&self, _key: &str, _data: Vec<u8>, _content_type: &str) -> Result<()> {
            Ok(())
        }

        async fn get(&self, _key: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            if self.fail_deletes {
                return Err(AppError::Internal("storage offline".to_string()));
            }
            Ok(())
        }
    }

    fn service(storage: Arc<RecordingStorage>) -> FileService {
        // Nothing listens on port 1
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(250))
            .connect_lazy("postgres://postgres@127.0.0.1:1/secure_file_manager_test")
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let access = Arc::new(AccessService::new(
            store.clone(),
            store.clone(),
            store,
            clock.clone(),
        ));
        let activity = Arc::new(ActivityService::new(pool.clone()));

        FileService::new(
            pool.clone(),
            storage,
            access.clone(),
            Arc::new(ShareService::new(
                pool.clone(),
                access,
                activity.clone(),
                clock.clone(),
            )),
            activity,
            Arc::new(SettingsService::new(pool)),
            clock,
            1024,
        )
    }

    fn stored_file() -> File {
        let now = Utc::now();
        File {
            id: Uuid::new_v4(),
            name: "notes".to_string(),
            description: String::new(),
            storage_key: "uploads/user_1/notes.txt".to_string(),
            original_filename: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            owner_id: Uuid::new_v4(),
            category_id: None,
            visibility: Visibility::Private,
            file_size: 5,
            file_type: ".txt".to_string(),
            is_favorite: false,
            download_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_remove_keeps_object_when_row_is_not_deleted() {
        let storage = Arc::new(RecordingStorage::default());
        let service = service(storage.clone());

        let result = service.remove(&stored_file()).await;

        assert!(result.is_err());
        assert!(storage.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_after_commit_is_not_an_error() {
        let storage = Arc::new(RecordingStorage {
            fail_deletes: true,
            ..Default::default()
        });
        let service = service(storage.clone());
        let file = stored_file();

        service.discard_object(&file).await;

        assert_eq!(*storage.deleted.lock().unwrap(), vec![file.storage_key]);
    }
}
