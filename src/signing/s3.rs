use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region, RequestChecksumCalculation};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::time::Duration;

use super::{check_request, SigningError, UrlIssuer};

#[derive(Debug, Clone)]
pub struct S3Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// S3-compatible presigner (AWS, MinIO). Uses path-style addressing so it
/// works against any endpoint without bucket DNS. Presigning is local; the
/// client never sends a request.
pub struct S3UrlIssuer {
    client: Client,
    bucket: String,
    /// `scheme://host` the URLs are signed for
    origin: String,
    external_host: Option<String>,
}

impl S3UrlIssuer {
    /// `endpoint` may carry a scheme (`https://minio:9000`); without one,
    /// `use_ssl` decides. `external_host` replaces the host in issued URLs
    /// after signing and forces https, for stores reached through a proxy
    /// that forwards the original `Host`.
    pub fn new(
        endpoint: &str,
        use_ssl: Option<bool>,
        external_host: Option<&str>,
        bucket: &str,
        credentials: S3Credentials,
    ) -> Result<Self, SigningError> {
        if credentials.access_key.is_empty() || credentials.secret_key.is_empty() {
            return Err(SigningError::Credentials(
                "S3 access key and secret key are required".to_string(),
            ));
        }

        let (mut scheme, host) = match endpoint.split_once("://") {
            Some((scheme, rest)) => (scheme.to_lowercase(), rest.trim_end_matches('/')),
            None => ("http".to_string(), endpoint.trim_end_matches('/')),
        };
        if let Some(ssl) = use_ssl {
            scheme = if ssl { "https" } else { "http" }.to_string();
        }
        if host.is_empty() {
            return Err(SigningError::Credentials("S3 endpoint is required".to_string()));
        }
        let origin = format!("{scheme}://{host}");

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(credentials.region))
            .endpoint_url(&origin)
            .credentials_provider(Credentials::new(
                credentials.access_key,
                credentials.secret_key,
                None,
                None,
                "file-broker",
            ))
            .force_path_style(true)
            // The uploader's body is unknown at signing time
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        Ok(Self {
            client: Client::from_conf(config),
            bucket: bucket.to_string(),
            origin,
            external_host: external_host
                .filter(|h| !h.is_empty())
                .map(str::to_string),
        })
    }

    fn rewrite_host(&self, uri: &str) -> String {
        match (&self.external_host, uri.strip_prefix(&self.origin)) {
            (Some(external), Some(rest)) => format!("https://{external}{rest}"),
            _ => uri.to_string(),
        }
    }
}

fn presigning_config(ttl: Duration) -> Result<PresigningConfig, SigningError> {
    PresigningConfig::expires_in(ttl).map_err(|e| SigningError::Presign(e.to_string()))
}

#[async_trait]
impl UrlIssuer for S3UrlIssuer {
    async fn upload_url(
        &self,
        path: &str,
        content_type: &str,
        max_size: u64,
        ttl: Duration,
    ) -> Result<String, SigningError> {
        check_request(path, ttl)?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .customize()
            .mutate_request(move |req| {
                if max_size == 0 {
                    return;
                }
                let separator = if req.uri().contains('?') { '&' } else { '?' };
                let uri = format!(
                    "{}{separator}x-amz-content-length-range=0%2C{max_size}",
                    req.uri()
                );
                if let Err(e) = req.set_uri(uri) {
                    tracing::warn!(error = %e, "Failed to add content length range to upload URL");
                }
            })
            .presigned(presigning_config(ttl)?)
            .await
            .map_err(|e| SigningError::Presign(e.to_string()))?;

        Ok(self.rewrite_host(presigned.uri()))
    }

    async fn download_url(&self, path: &str, ttl: Duration) -> Result<String, SigningError> {
        check_request(path, ttl)?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(presigning_config(ttl)?)
            .await
            .map_err(|e| SigningError::Presign(e.to_string()))?;

        Ok(self.rewrite_host(presigned.uri()))
    }
}
