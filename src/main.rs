use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use file_broker::{
    api,
    config::{Config, StorageBackend},
    service::{FileLimits, FileService},
    signing::{GcsUrlIssuer, S3Credentials, S3UrlIssuer, UrlIssuer},
    storage::Database,
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "file-broker starting");

    let config = Config::load()?;

    let db = Database::open(&config.node.data_dir)?;
    info!("Database opened at: {}", config.node.data_dir);

    let issuer = build_issuer(&config).await?;

    let files = FileService::new(
        Arc::new(db.clone()),
        issuer,
        FileLimits {
            max_upload_size: config.upload.max_size,
            upload_ttl: config.upload.ttl,
            download_ttl: config.download_ttl,
        },
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        files,
    });

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.node.bind_address).await?;
    info!("Listening on: {}", config.node.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn build_issuer(config: &Config) -> anyhow::Result<Arc<dyn UrlIssuer>> {
    match config.storage.backend {
        StorageBackend::S3 => {
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
            )?;
            info!(
                endpoint = %s3.endpoint,
                bucket = %s3.bucket,
                "Using S3 URL signer"
            );
            Ok(Arc::new(issuer))
        }
        StorageBackend::Gcs => {
            let (Some(bucket), Some(credentials_file)) = (
                config.storage.gcs_bucket.as_deref(),
                config.storage.gcs_credentials_file.as_deref(),
            ) else {
                anyhow::bail!("GCS_BUCKET and GCS_CREDENTIALS_FILE validated in config");
            };
            let issuer = GcsUrlIssuer::new(bucket, credentials_file).await?;
            info!(bucket = %bucket, "Using GCS URL signer");
            Ok(Arc::new(issuer))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
