#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use file_broker::service::{FileLimits, FileService};
use file_broker::signing::{SigningError, UrlIssuer};
use file_broker::storage::{DatabaseError, FileRecord, FileRepository, RepositoryError};

pub const MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

pub fn limits() -> FileLimits {
    FileLimits {
        max_upload_size: MAX_UPLOAD_SIZE,
        upload_ttl: Duration::from_secs(5 * 60),
        download_ttl: Duration::from_secs(15 * 60),
    }
}

fn store_failure() -> RepositoryError {
    RepositoryError::Database(DatabaseError::Io(std::io::Error::other("store unavailable")))
}

/// In-memory record store that counts calls and can be told to fail.
#[derive(Default)]
pub struct MemoryRepository {
    records: Mutex<HashMap<String, FileRecord>>,
    pub creates: AtomicUsize,
    pub gets: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MemoryRepository {
    pub fn record(&self, id: &str) -> Option<FileRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }

    pub fn only_record(&self) -> FileRecord {
        let records = self.records.lock().unwrap();
        assert_eq!(records.len(), 1, "expected exactly one record");
        records.values().next().cloned().unwrap()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileRepository for MemoryRepository {
    async fn create(&self, file: &FileRecord) -> Result<FileRecord, RepositoryError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&file.id) {
            return Err(RepositoryError::AlreadyExists(file.id.clone()));
        }
        records.insert(file.id.clone(), file.clone());
        Ok(file.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<FileRecord, RepositoryError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        self.records
            .lock()
            .unwrap()
            .get(id)
            .filter(|f| !f.is_deleted)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn update(&self, file: &FileRecord) -> Result<FileRecord, RepositoryError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&file.id) {
            Some(stored) if !stored.is_deleted => {
                stored.status = file.status;
                stored.updated_at = file.updated_at;
                Ok(stored.clone())
            }
            _ => Err(RepositoryError::NotFound(file.id.clone())),
        }
    }

    async fn soft_delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        let mut records = self.records.lock().unwrap();
        match records.get_mut(id) {
            Some(stored) if !stored.is_deleted => {
                stored.mark_deleted();
                Ok(())
            }
            _ => Err(RepositoryError::NotFound(id.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssuedUrl {
    Upload {
        path: String,
        content_type: String,
        max_size: u64,
        ttl: Duration,
    },
    Download {
        path: String,
        ttl: Duration,
    },
}

/// URL issuer returning predictable URLs and remembering every request.
#[derive(Default)]
pub struct RecordingIssuer {
    calls: Mutex<Vec<IssuedUrl>>,
    pub fail: AtomicBool,
}

impl RecordingIssuer {
    pub fn calls(&self) -> Vec<IssuedUrl> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UrlIssuer for RecordingIssuer {
    async fn upload_url(
        &self,
        path: &str,
        content_type: &str,
        max_size: u64,
        ttl: Duration,
    ) -> Result<String, SigningError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SigningError::Crypto("signer offline".to_string()));
        }
        self.calls.lock().unwrap().push(IssuedUrl::Upload {
            path: path.to_string(),
            content_type: content_type.to_string(),
            max_size,
            ttl,
        });
        Ok(format!("https://storage.test/{path}?op=put"))
    }

    async fn download_url(&self, path: &str, ttl: Duration) -> Result<String, SigningError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SigningError::Crypto("signer offline".to_string()));
        }
        self.calls.lock().unwrap().push(IssuedUrl::Download {
            path: path.to_string(),
            ttl,
        });
        Ok(format!("https://storage.test/{path}?op=get"))
    }
}

pub struct Harness {
    pub repo: Arc<MemoryRepository>,
    pub issuer: Arc<RecordingIssuer>,
    pub service: FileService,
}

pub fn harness() -> Harness {
    let repo = Arc::new(MemoryRepository::default());
    let issuer = Arc::new(RecordingIssuer::default());
    let service = FileService::new(repo.clone(), issuer.clone(), limits());
    Harness {
        repo,
        issuer,
        service,
    }
}
