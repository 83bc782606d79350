//! Shared test helpers for file-broker router tests.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AuthConfig, Config, NodeConfig, S3Config, StorageConfig, UploadConfig};
use crate::service::{FileLimits, FileService};
use crate::signing::{S3Credentials, S3UrlIssuer};
use crate::storage::Database;
use crate::AppState;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const INTERNAL_SECRET: &str = "test-internal-secret";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const S3_HOST: &str = "s3.test.local";

/// Create a test AppState with a temporary database and an S3 signer pointed
/// at a fake endpoint. Signing is offline, so nothing is contacted.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");

    let config = Config {
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            internal_secret: INTERNAL_SECRET.to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
        },
        storage: StorageConfig {
            s3: S3Config {
                endpoint: format!("http://{S3_HOST}"),
                access_key: "test-access".to_string(),
                secret_key: "test-secret".to_string(),
                bucket: "test-bucket".to_string(),
                ..S3Config::default()
            },
            ..StorageConfig::default()
        },
        upload: UploadConfig {
            max_size: 10 * 1024 * 1024, // 10MB for tests
            ttl: Duration::from_secs(300),
        },
        download_ttl: Duration::from_secs(900),
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let s3 = &config.storage.s3;
    let issuer = S3UrlIssuer::new(
        &s3.endpoint,
        s3.use_ssl,
        s3.external_host.as_deref(),
        &s3.bucket,
        S3Credentials {
            access_key: s3.access_key.clone(),
            secret_key: s3.secret_key.clone(),
            region: s3.region.clone(),
        },
    )
    .expect("Failed to create test signer");

    let files = FileService::new(
        Arc::new(db.clone()),
        Arc::new(issuer),
        FileLimits {
            max_upload_size: config.upload.max_size,
            upload_ttl: config.upload.ttl,
            download_ttl: config.download_ttl,
        },
    );

    Arc::new(AppState { config, db, files })
}

/// Mint a bearer token the way the upstream auth service would.
pub fn bearer(user_id: &str, scopes: &[&str]) -> String {
    let claims = serde_json::json!({
        "sub": user_id,
        "scope": scopes.join(" "),
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token");
    format!("Bearer {token}")
}
