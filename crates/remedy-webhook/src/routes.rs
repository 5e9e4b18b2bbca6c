//! HTTP surface: one POST route per configured platform.
//!
//! Routes carry the platform name in a closure so the manager never has
//! to reverse-map paths. Status mapping: 401 for authentication
//! failures, 404 for unknown platforms, 400 for bodies that are not
//! JSON, 200 with a `RecoveryResponse` body for everything else.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use crate::error::WebhookError;
use crate::manager::CICDIntegrationManager;
use remedy_core::METRICS;

/// Build the webhook router from the manager's configured platforms.
pub fn router(manager: Arc<CICDIntegrationManager>) -> Router {
    let mut router = Router::new().route("/healthz", axum::routing::get(healthz));
    for platform in manager.platform_configs() {
        let manager = manager.clone();
        let name = platform.name.clone();
        router = router.route(
            &platform.path,
            post(move |headers: HeaderMap, body: Bytes| {
                handle_webhook(manager.clone(), name.clone(), headers, body)
            }),
        );
    }
    router
}

async fn healthz() -> &'static str {
    "ok"
}

async fn handle_webhook(
    manager: Arc<CICDIntegrationManager>,
    platform: String,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match manager
        .process_webhook_event(&platform, &body, &headers)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            let status = match &err {
                WebhookError::Unauthorized(_) => {
                    METRICS.inc_webhooks_rejected();
                    StatusCode::UNAUTHORIZED
                }
                WebhookError::UnknownPlatform(_) => StatusCode::NOT_FOUND,
                WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
                WebhookError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            warn!(platform = %platform, status = %status, error = %err, "webhook rejected");
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}
