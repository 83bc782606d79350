//! file-broker - presigned URL broker and file lifecycle tracker for object storage
//!
//! This crate hands out time-limited upload and download URLs and keeps a
//! metadata record per file:
//! - Lifecycle engine: pending → uploaded → soft-deleted, with owner/scope
//!   based download authorization
//! - redb embedded database for file records (ACID, crash-safe)
//! - Offline URL signing for S3-compatible stores (SigV4) and GCS (V4)
//! - REST API for services, end users and storage event webhooks

pub mod api;
pub mod config;
pub mod events;
pub mod service;
pub mod signing;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use config::Config;
use service::FileService;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub files: FileService,
}
