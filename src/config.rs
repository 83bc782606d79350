use std::time::Duration;

use thiserror::Error;

use crate::signing::MAX_URL_TTL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    /// Lifetime of issued download URLs
    pub download_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret for end-user bearer tokens
    pub jwt_secret: String,
    /// Shared secret other services send in `x-internal-token`
    pub internal_secret: String,
    /// Shared secret the storage provider sends in `x-webhook-secret`
    pub webhook_secret: String,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum declared upload size in bytes
    pub max_size: u64,
    pub ttl: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Gcs,
    S3,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3: S3Config,
    /// GCS bucket name (required when backend is gcs)
    pub gcs_bucket: Option<String>,
    /// Path to GCS service account JSON (required when backend is gcs)
    pub gcs_credentials_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// Public host written into issued URLs when clients reach the store
    /// through a proxy
    pub external_host: Option<String>,
    pub use_ssl: Option<bool>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            region: "us-east-1".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: String::new(),
            external_host: None,
            use_ssl: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            s3: S3Config::default(),
            gcs_bucket: None,
            gcs_credentials_file: None,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size: 100 * 1024 * 1024, // 100MB
            ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let data_dir = var("DATA_DIR").unwrap_or_else(|| "./data".to_string());

        let auth = AuthConfig {
            jwt_secret: var("JWT_SECRET").unwrap_or_default(),
            internal_secret: var("INTERNAL_SERVICE_SECRET").unwrap_or_default(),
            webhook_secret: var("WEBHOOK_SECRET").unwrap_or_default(),
        };

        let backend = match var("STORAGE_BACKEND")
            .unwrap_or_else(|| "s3".to_string())
            .to_lowercase()
            .as_str()
        {
            "gcs" => StorageBackend::Gcs,
            "s3" => StorageBackend::S3,
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "STORAGE_BACKEND must be 's3' or 'gcs', got '{other}'"
                )))
            }
        };

        let defaults = S3Config::default();
        let s3 = S3Config {
            endpoint: var("S3_ENDPOINT").unwrap_or(defaults.endpoint),
            region: var("S3_REGION").unwrap_or(defaults.region),
            access_key: var("S3_ACCESS_KEY").unwrap_or_default(),
            secret_key: var("S3_SECRET_KEY").unwrap_or_default(),
            bucket: var("S3_BUCKET").unwrap_or_default(),
            external_host: var("S3_EXTERNAL_HOST"),
            use_ssl: var("S3_USE_SSL").map(|v| v == "true" || v == "1"),
        };

        let upload_defaults = UploadConfig::default();
        let max_size = match var("UPLOAD_MAX_SIZE") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("UPLOAD_MAX_SIZE is not a byte count: {raw}"))
            })?,
            None => upload_defaults.max_size,
        };
        let upload_ttl = duration_var(var("UPLOAD_TTL"), "UPLOAD_TTL", upload_defaults.ttl)?;
        let download_ttl = duration_var(
            var("DOWNLOAD_TTL"),
            "DOWNLOAD_TTL",
            Duration::from_secs(15 * 60),
        )?;

        let config = Config {
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            auth,
            storage: StorageConfig {
                backend,
                s3,
                gcs_bucket: var("GCS_BUCKET"),
                gcs_credentials_file: var("GCS_CREDENTIALS_FILE"),
            },
            upload: UploadConfig {
                max_size,
                ttl: upload_ttl,
            },
            download_ttl,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("JWT_SECRET", &self.auth.jwt_secret),
            ("INTERNAL_SERVICE_SECRET", &self.auth.internal_secret),
            ("WEBHOOK_SECRET", &self.auth.webhook_secret),
        ] {
            if value.is_empty() {
                return Err(ConfigError::ValidationError(format!("{name} is required")));
            }
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                let s3 = &self.storage.s3;
                if s3.access_key.is_empty() || s3.secret_key.is_empty() || s3.bucket.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "S3_ACCESS_KEY, S3_SECRET_KEY and S3_BUCKET are required when STORAGE_BACKEND=s3"
                            .to_string(),
                    ));
                }
            }
            StorageBackend::Gcs => {
                if self.storage.gcs_bucket.is_none() || self.storage.gcs_credentials_file.is_none()
                {
                    return Err(ConfigError::ValidationError(
                        "GCS_BUCKET and GCS_CREDENTIALS_FILE are required when STORAGE_BACKEND=gcs"
                            .to_string(),
                    ));
                }
            }
        }

        if self.upload.max_size == 0 {
            return Err(ConfigError::ValidationError(
                "UPLOAD_MAX_SIZE must be greater than 0".to_string(),
            ));
        }

        for (name, ttl) in [
            ("UPLOAD_TTL", self.upload.ttl),
            ("DOWNLOAD_TTL", self.download_ttl),
        ] {
            if ttl.as_secs() == 0 || ttl > MAX_URL_TTL {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 1s and 7 days"
                )));
            }
        }

        Ok(())
    }
}

fn duration_var(
    raw: Option<String>,
    name: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match raw {
        Some(raw) => parse_duration(&raw).ok_or_else(|| {
            ConfigError::ValidationError(format!("{name} is not a valid duration: {raw}"))
        }),
        None => Ok(default),
    }
}

/// Parse `90`, `90s`, `15m` or `1h`. Bare numbers are seconds.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last()? {
        's' => (&raw[..raw.len() - 1], 1),
        'm' => (&raw[..raw.len() - 1], 60),
        'h' => (&raw[..raw.len() - 1], 60 * 60),
        _ => (raw, 1),
    };
    let value: u64 = digits.parse().ok()?;
    value.checked_mul(multiplier).map(Duration::from_secs)
}
