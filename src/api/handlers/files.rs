use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::auth::{InternalCaller, Requester};
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::service::{FileError, UploadSlot};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateUploadRequest {
    pub user_id: String,
    pub content_type: String,
    pub size: i64,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    /// When false, return the URL in a JSend body instead of a 302.
    #[serde(default = "default_redirect")]
    pub redirect: bool,
}

fn default_redirect() -> bool {
    true
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a file for `user_id` and return a presigned PUT URL.
/// Route: POST /api/v1/internal/files
pub async fn create_upload(
    State(state): State<Arc<AppState>>,
    _caller: InternalCaller,
    AppJson(req): AppJson<CreateUploadRequest>,
) -> Result<Json<JSend<UploadSlot>>, ApiError> {
    let slot = state
        .files
        .begin_upload(&req.user_id, &req.content_type, req.size)
        .await?;

    Ok(JSend::success(slot))
}

/// Route: DELETE /api/v1/internal/files/:file_id
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    _caller: InternalCaller,
    Path(file_id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    state.files.delete_file(&file_id).await?;
    Ok(JSend::success(()))
}

/// Route: GET /api/v1/files/:file_id/download
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Requester(identity): Requester,
    AppQuery(params): AppQuery<DownloadParams>,
) -> Result<Response, ApiError> {
    let result = state.files.download_url(&file_id, identity.as_ref()).await;

    let download = match result {
        Ok(download) => download,
        Err(FileError::AccessDenied) if identity.is_none() => {
            return Err(ApiError::unauthorized("authentication required"));
        }
        Err(e) => return Err(e.into()),
    };

    let cache = (header::CACHE_CONTROL, "no-store".to_string());
    if params.redirect {
        Ok((
            StatusCode::FOUND,
            [(header::LOCATION, download.download_url), cache],
        )
            .into_response())
    } else {
        Ok(([cache], JSend::success(download)).into_response())
    }
}
