use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Liveness: the process is up and serving requests.
pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness: the metadata store can be read.
pub async fn ready(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<HealthResponse>>, ApiError> {
    state.db.ping().map_err(|e| {
        tracing::error!(error = %e, "Metadata store is not readable");
        ApiError::unavailable("metadata store unavailable")
    })?;

    Ok(JSend::success(HealthResponse {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
