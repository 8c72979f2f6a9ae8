//! CMS webhook endpoints.
//!
//! Bodies are taken as raw bytes: the signature covers the exact payload the
//! CMS sent, so nothing may re-serialize it before verification.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{info, warn};

use super::error::ApiResult;
use super::metrics;
use super::state::ServerState;
use crate::sync::{
    handle_webhook, ArticleSync, EventSync, SignatureError, SyncOutcome, SyncTarget,
    SIGNATURE_HEADER,
};

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

fn signature_failure_reason(err: &SignatureError) -> &'static str {
    match err {
        SignatureError::Missing => "missing",
        SignatureError::Malformed => "malformed",
        SignatureError::Mismatch => "mismatch",
        SignatureError::NotConfigured => "not_configured",
    }
}

fn apply_webhook(
    state: &ServerState,
    target: &dyn SyncTarget,
    headers: &HeaderMap,
    body: &[u8],
) -> ApiResult<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(err) = state.config.signature_policy.verify(signature, body) {
        warn!("Rejected {} webhook: {}", target.entity(), err);
        metrics::record_signature_failure(target.entity(), signature_failure_reason(&err));
        return Err(err.into());
    }

    let store = state.stores.service();
    let outcome = handle_webhook(target, &*store, body)?;
    info!(
        "{} webhook {} {}",
        target.entity(),
        outcome.action.as_str(),
        outcome.id.as_deref().unwrap_or("-")
    );
    metrics::record_webhook(target.entity(), outcome.action.as_str());

    Ok(Json(WebhookResponse {
        success: true,
        outcome,
    }))
}

async fn blog_webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    let target = ArticleSync::new(state.config.fallback_author_id.clone());
    apply_webhook(&state, &target, &headers, &body)
}

async fn event_webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    apply_webhook(&state, &EventSync, &headers, &body)
}

pub fn webhook_routes() -> Router<ServerState> {
    Router::new()
        .route("/webhooks/blog", post(blog_webhook))
        .route("/webhooks/event", post(event_webhook))
}
