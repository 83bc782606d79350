use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upload state of a file. Only ever moves from `Pending` to `Uploaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Uploaded,
}

/// A file record stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub owner_id: String,
    /// Object key in the bucket, always `{owner_id}/{id}`
    pub storage_path: String,
    pub size: u64,
    pub content_type: String,
    pub status: FileStatus,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Build a fresh pending record with a newly generated id.
    pub fn new_pending(owner_id: &str, content_type: &str, size: u64) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        Self {
            storage_path: storage_path(owner_id, &id),
            id,
            owner_id: owner_id.to_string(),
            size,
            content_type: content_type.to_string(),
            status: FileStatus::Pending,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.status == FileStatus::Uploaded
    }

    pub fn mark_uploaded(&mut self) {
        self.status = FileStatus::Uploaded;
        self.updated_at = Utc::now();
    }

    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.updated_at = Utc::now();
    }
}

/// Object key for a file owned by `owner_id`.
pub fn storage_path(owner_id: &str, file_id: &str) -> String {
    format!("{owner_id}/{file_id}")
}
