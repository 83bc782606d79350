pub mod db;
mod files;
pub mod models;
mod tables;

pub use db::{Database, DatabaseError};
pub use models::{FileRecord, FileStatus};
pub use tables::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("File already exists: {0}")]
    AlreadyExists(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Durable storage for file records.
///
/// Reads never return soft-deleted records, and writes against a soft-deleted
/// record report `NotFound`. Implementations own conflict resolution for
/// concurrent writes to the same id.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn create(&self, file: &FileRecord) -> Result<FileRecord, RepositoryError>;
    async fn get_by_id(&self, id: &str) -> Result<FileRecord, RepositoryError>;
    async fn update(&self, file: &FileRecord) -> Result<FileRecord, RepositoryError>;
    async fn soft_delete(&self, id: &str) -> Result<(), RepositoryError>;
}

/// Run a redb call on the blocking pool. Write transactions wait for the
/// single writer lock and must not hold up a runtime worker.
async fn blocking<T, F>(db: &Database, f: F) -> Result<T, RepositoryError>
where
    T: Send + 'static,
    F: FnOnce(Database) -> Result<T, RepositoryError> + Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(db)).await?
}

#[async_trait]
impl FileRepository for Database {
    async fn create(&self, file: &FileRecord) -> Result<FileRecord, RepositoryError> {
        let file = file.clone();
        blocking(self, move |db| {
            if !db.insert_file(&file)? {
                return Err(RepositoryError::AlreadyExists(file.id));
            }
            Ok(file)
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> Result<FileRecord, RepositoryError> {
        let id = id.to_string();
        blocking(self, move |db| {
            db.get_file(&id)?.ok_or(RepositoryError::NotFound(id))
        })
        .await
    }

    async fn update(&self, file: &FileRecord) -> Result<FileRecord, RepositoryError> {
        let file = file.clone();
        blocking(self, move |db| {
            db.update_file(&file)?
                .ok_or(RepositoryError::NotFound(file.id))
        })
        .await
    }

    async fn soft_delete(&self, id: &str) -> Result<(), RepositoryError> {
        let id = id.to_string();
        blocking(self, move |db| {
            if !db.soft_delete_file(&id)? {
                return Err(RepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}
