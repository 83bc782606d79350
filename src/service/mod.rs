//! File lifecycle engine.
//!
//! Owns every state transition of a file record and the download
//! authorization decision. Talks to the metadata store and the URL issuer only
//! through [`FileRepository`] and [`UrlIssuer`]; knows nothing about HTTP.
//!
//! ```text
//!   (none) --begin_upload--> pending --confirm_upload--> uploaded
//!   uploaded --confirm_upload--> uploaded            (no-op)
//!   pending|uploaded --delete_file--> deleted        (terminal, unreadable)
//! ```

pub mod access;
mod error;

pub use access::{can_read, read_scope, Identity};
pub use error::FileError;

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::signing::UrlIssuer;
use crate::storage::{FileRecord, FileRepository, RepositoryError};

#[derive(Debug, Clone, Copy)]
pub struct FileLimits {
    pub max_upload_size: u64,
    pub upload_ttl: Duration,
    pub download_ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSlot {
    pub file_id: String,
    pub upload_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadUrl {
    pub download_url: String,
}

pub struct FileService {
    repo: Arc<dyn FileRepository>,
    issuer: Arc<dyn UrlIssuer>,
    limits: FileLimits,
}

impl FileService {
    pub fn new(
        repo: Arc<dyn FileRepository>,
        issuer: Arc<dyn UrlIssuer>,
        limits: FileLimits,
    ) -> Self {
        Self {
            repo,
            issuer,
            limits,
        }
    }

    /// Register a pending file and hand back a signed PUT URL for it.
    pub async fn begin_upload(
        &self,
        owner_id: &str,
        content_type: &str,
        declared_size: i64,
    ) -> Result<UploadSlot, FileError> {
        let size = self.validate_upload(owner_id, content_type, declared_size)?;

        let file = FileRecord::new_pending(owner_id, content_type, size);
        let created = self
            .repo
            .create(&file)
            .await
            .map_err(|e| FileError::internal("failed to create file record", e))?;

        let upload_url = self
            .issuer
            .upload_url(
                &created.storage_path,
                &created.content_type,
                self.limits.max_upload_size,
                self.limits.upload_ttl,
            )
            .await
            .map_err(|e| FileError::internal("failed to generate upload URL", e))?;

        tracing::debug!(file_id = %created.id, owner_id = %owner_id, size, "Registered pending upload");

        Ok(UploadSlot {
            file_id: created.id,
            upload_url,
        })
    }

    /// Mark a file as uploaded after the storage provider reports the object.
    ///
    /// Safe to call any number of times for the same id. Unknown or deleted
    /// ids are logged and ignored.
    pub async fn confirm_upload(&self, file_id: &str) -> Result<(), FileError> {
        if file_id.is_empty() {
            return Err(FileError::FileIdRequired);
        }

        let mut file = match self.repo.get_by_id(file_id).await {
            Ok(file) => file,
            Err(RepositoryError::NotFound(_)) => {
                tracing::info!(file_id = %file_id, "Ignoring upload confirmation for unknown file");
                return Ok(());
            }
            Err(e) => return Err(FileError::internal("failed to get file", e)),
        };

        if file.is_uploaded() {
            tracing::debug!(file_id = %file_id, "Upload already confirmed");
            return Ok(());
        }

        file.mark_uploaded();
        match self.repo.update(&file).await {
            Ok(_) => {
                tracing::info!(file_id = %file_id, "Confirmed upload");
                Ok(())
            }
            Err(RepositoryError::NotFound(_)) => {
                tracing::info!(file_id = %file_id, "File deleted before upload confirmation");
                Ok(())
            }
            Err(e) => Err(FileError::internal("failed to update file status", e)),
        }
    }

    /// Signed GET URL for a file the requester is allowed to read.
    pub async fn download_url(
        &self,
        file_id: &str,
        requester: Option<&Identity>,
    ) -> Result<DownloadUrl, FileError> {
        if file_id.is_empty() {
            return Err(FileError::FileIdRequired);
        }

        let file = match self.repo.get_by_id(file_id).await {
            Ok(file) => file,
            Err(RepositoryError::NotFound(_)) => {
                return Err(FileError::NotFound(file_id.to_string()))
            }
            Err(e) => return Err(FileError::internal("failed to get file", e)),
        };

        if !can_read(&file, requester) {
            tracing::debug!(
                file_id = %file_id,
                user_id = requester.map(|i| i.user_id.as_str()).unwrap_or(""),
                "Download denied"
            );
            return Err(FileError::AccessDenied);
        }

        let download_url = self
            .issuer
            .download_url(&file.storage_path, self.limits.download_ttl)
            .await
            .map_err(|e| FileError::internal("failed to generate download URL", e))?;

        Ok(DownloadUrl { download_url })
    }

    /// Soft-delete a file. Callers are trusted; no ownership check here.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), FileError> {
        if file_id.is_empty() {
            return Err(FileError::FileIdRequired);
        }

        match self.repo.soft_delete(file_id).await {
            Ok(()) => {
                tracing::info!(file_id = %file_id, "Deleted file");
                Ok(())
            }
            Err(RepositoryError::NotFound(_)) => Err(FileError::NotFound(file_id.to_string())),
            Err(e) => Err(FileError::internal("failed to delete file", e)),
        }
    }

    fn validate_upload(
        &self,
        owner_id: &str,
        content_type: &str,
        declared_size: i64,
    ) -> Result<u64, FileError> {
        if owner_id.is_empty() {
            return Err(FileError::InvalidInput("owner id is required".into()));
        }
        if content_type.is_empty() {
            return Err(FileError::InvalidInput("content type is required".into()));
        }
        if declared_size <= 0 {
            return Err(FileError::InvalidInput("file size must be positive".into()));
        }
        let size = declared_size as u64;
        if size > self.limits.max_upload_size {
            return Err(FileError::InvalidInput(
                "file size exceeds maximum allowed size".into(),
            ));
        }
        Ok(size)
    }
}
