use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use crate::api::auth::WebhookCaller;
use crate::api::response::JSend;
use crate::events::EventNotification;
use crate::AppState;

#[derive(Debug, Default, Serialize)]
pub struct WebhookResponse {
    pub confirmed: u64,
    pub failed: u64,
}

/// Storage provider callback for bucket events.
/// Route: POST /api/v1/webhook/storage
///
/// Always acknowledges an authenticated delivery, even when the body can't be
/// parsed or a confirmation fails, so the provider doesn't redeliver it
/// forever. Failures are logged.
pub async fn storage_event(
    State(state): State<Arc<AppState>>,
    _caller: WebhookCaller,
    body: Bytes,
) -> Json<JSend<WebhookResponse>> {
    let notification: EventNotification = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to decode storage event");
            return JSend::success(WebhookResponse::default());
        }
    };

    let mut response = WebhookResponse::default();
    for file_id in notification.created_file_ids() {
        match state.files.confirm_upload(&file_id).await {
            Ok(()) => response.confirmed += 1,
            Err(e) => {
                tracing::error!(file_id = %file_id, error = ?e, "Failed to confirm upload");
                response.failed += 1;
            }
        }
    }

    JSend::success(response)
}
