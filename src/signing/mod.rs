mod gcs;
mod s3;

pub use gcs::GcsUrlIssuer;
pub use s3::{S3Credentials, S3UrlIssuer};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Longest lifetime either provider accepts for a presigned URL.
pub const MAX_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid credentials: {0}")]
    Credentials(String),
    #[error("Signing failed: {0}")]
    Crypto(String),
    #[error("Presigning failed: {0}")]
    Presign(String),
    #[error("URL lifetime must be between 1 second and 7 days, got {0:?}")]
    InvalidTtl(Duration),
    #[error("Invalid object path: {0:?}")]
    InvalidPath(String),
}

/// Produces time-limited URLs granting direct access to one object.
#[async_trait]
pub trait UrlIssuer: Send + Sync {
    /// Signed PUT URL. The uploader must send the same `Content-Type`.
    async fn upload_url(
        &self,
        path: &str,
        content_type: &str,
        max_size: u64,
        ttl: Duration,
    ) -> Result<String, SigningError>;

    /// Signed GET URL.
    async fn download_url(&self, path: &str, ttl: Duration) -> Result<String, SigningError>;
}

fn check_request(path: &str, ttl: Duration) -> Result<(), SigningError> {
    if ttl.as_secs() == 0 || ttl > MAX_URL_TTL {
        return Err(SigningError::InvalidTtl(ttl));
    }
    if path.is_empty() || path.starts_with('/') {
        return Err(SigningError::InvalidPath(path.to_string()));
    }
    Ok(())
}
