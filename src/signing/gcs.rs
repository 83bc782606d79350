use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ring::signature::RsaKeyPair;
use serde::Deserialize;
use std::time::Duration;

use super::{check_request, SigningError, UrlIssuer};

const ALGORITHM: &str = "GOOG4-RSA-SHA256";
const HOST: &str = "storage.googleapis.com";

/// Google Cloud Storage V4 signer. Signs locally with the service account's
/// private key, so no network call is made per URL.
pub struct GcsUrlIssuer {
    bucket: String,
    client_email: String,
    key_pair: RsaKeyPair,
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
}

impl GcsUrlIssuer {
    pub async fn new(bucket: &str, credentials_file: &str) -> Result<Self, SigningError> {
        let key_json = tokio::fs::read_to_string(credentials_file).await?;
        Self::from_key_json(bucket, &key_json)
    }

    pub fn from_key_json(bucket: &str, key_json: &str) -> Result<Self, SigningError> {
        let key: ServiceAccountKey = serde_json::from_str(key_json)
            .map_err(|e| SigningError::Credentials(format!("invalid service account key: {e}")))?;
        let key_pair = parse_rsa_key(&key.private_key)?;

        Ok(Self {
            bucket: bucket.to_string(),
            client_email: key.client_email,
            key_pair,
        })
    }

    fn sign_url(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, SigningError> {
        let goog_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!("{}/auto/storage/goog4_request", now.format("%Y%m%d"));
        let uri = format!("/{}/{}", urlencoding::encode(&self.bucket), encode_path(path));

        let mut all_headers: Vec<(String, String)> = vec![("host".to_string(), HOST.to_string())];
        all_headers.extend(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let (header_block, signed_headers) = canonical_headers(&all_headers);

        let params = vec![
            ("X-Goog-Algorithm".to_string(), ALGORITHM.to_string()),
            (
                "X-Goog-Credential".to_string(),
                format!("{}/{scope}", self.client_email),
            ),
            ("X-Goog-Date".to_string(), goog_date.clone()),
            ("X-Goog-Expires".to_string(), ttl.as_secs().to_string()),
            ("X-Goog-SignedHeaders".to_string(), signed_headers.clone()),
        ];
        let query = canonical_query(&params);

        let request = canonical_request(method, &uri, &query, &header_block, &signed_headers);
        let string_to_sign = format!(
            "{ALGORITHM}\n{goog_date}\n{scope}\n{}",
            sha256_hex(request.as_bytes())
        );

        let signature = sign_rs256(&self.key_pair, string_to_sign.as_bytes())?;
        Ok(format!(
            "https://{HOST}{uri}?{query}&X-Goog-Signature={}",
            hex::encode(signature)
        ))
    }
}

#[async_trait]
impl UrlIssuer for GcsUrlIssuer {
    async fn upload_url(
        &self,
        path: &str,
        content_type: &str,
        _max_size: u64,
        ttl: Duration,
    ) -> Result<String, SigningError> {
        check_request(path, ttl)?;
        self.sign_url("PUT", path, &[("content-type", content_type)], Utc::now(), ttl)
    }

    async fn download_url(&self, path: &str, ttl: Duration) -> Result<String, SigningError> {
        check_request(path, ttl)?;
        self.sign_url("GET", path, &[], Utc::now(), ttl)
    }
}

// ============================================================================
// Canonical request helpers
// ============================================================================

/// Percent-encode each segment of an object key, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Encode and sort query parameters into canonical form.
fn canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Headers must already be lowercase. Returns (canonical headers, signed header list).
fn canonical_headers(headers: &[(String, String)]) -> (String, String) {
    let mut sorted: Vec<&(String, String)> = headers.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical: String = sorted
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();
    let signed = sorted
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");
    (canonical, signed)
}

fn canonical_request(
    method: &str,
    uri: &str,
    query: &str,
    headers: &str,
    signed_headers: &str,
) -> String {
    format!("{method}\n{uri}\n{query}\n{headers}\n{signed_headers}\nUNSIGNED-PAYLOAD")
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(ring::digest::digest(&ring::digest::SHA256, data).as_ref())
}

fn parse_rsa_key(private_key_pem: &str) -> Result<RsaKeyPair, SigningError> {
    // Strip PEM headers and decode base64
    let der_b64: String = private_key_pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .map(str::trim)
        .collect();
    let der = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &der_b64)
        .map_err(|e| SigningError::Credentials(format!("private key is not valid base64: {e}")))?;

    RsaKeyPair::from_pkcs8(&der)
        .map_err(|e| SigningError::Credentials(format!("Failed to parse RSA key: {e}")))
}

fn sign_rs256(key_pair: &RsaKeyPair, data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            data,
            &mut signature,
        )
        .map_err(|e| SigningError::Crypto(format!("Failed to sign: {e}")))?;
    Ok(signature)
}
