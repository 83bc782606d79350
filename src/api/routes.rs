use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // End users (bearer token)
        .route("/files/:file_id/download", get(handlers::download_file))
        // Service-to-service (x-internal-token)
        .route("/internal/files", post(handlers::create_upload))
        .route("/internal/files/:file_id", delete(handlers::delete_file))
        // Storage provider events (x-webhook-secret)
        .route("/webhook/storage", post(handlers::storage_event));

    Router::new()
        .nest("/api/v1", api)
        .route("/healthz", get(handlers::health))
        .route("/readyz", get(handlers::ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
