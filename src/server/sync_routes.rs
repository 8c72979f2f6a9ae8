//! Manually triggered synchronization: bulk CMS → relational runs and
//! publishing relational articles back to the CMS.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{ApiError, ApiResult};
use super::metrics;
use super::state::ServerState;
use crate::sync::{sync_all, ArticleSync, BatchReport, EventSync, ReverseSync, SyncTarget};

#[derive(Debug, Deserialize)]
pub struct AdminKeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub success: bool,
    pub document_id: String,
}

fn ensure_allowed(state: &ServerState, query: &AdminKeyQuery) -> ApiResult<()> {
    if state.batch_gate.allows(query.key.as_deref()) {
        Ok(())
    } else {
        warn!("Rejected sync request without a valid admin key");
        Err(ApiError::Unauthorized("Unauthorized".to_string()))
    }
}

async fn run_batch(state: &ServerState, target: &dyn SyncTarget) -> ApiResult<Json<BatchReport>> {
    let store = state.stores.service();
    let report = sync_all(target, &*state.cms, &*store).await?;
    for item in &report.results {
        metrics::record_batch_document(target.entity(), item.status.as_str());
    }
    info!("{} batch sync: {}", target.entity(), report.message);
    Ok(Json(report))
}

async fn sync_blogs(
    State(state): State<ServerState>,
    Query(query): Query<AdminKeyQuery>,
) -> ApiResult<Json<BatchReport>> {
    ensure_allowed(&state, &query)?;
    let target = ArticleSync::new(state.config.fallback_author_id.clone());
    run_batch(&state, &target).await
}

async fn sync_events(
    State(state): State<ServerState>,
    Query(query): Query<AdminKeyQuery>,
) -> ApiResult<Json<BatchReport>> {
    ensure_allowed(&state, &query)?;
    run_batch(&state, &EventSync).await
}

async fn publish_article(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<AdminKeyQuery>,
) -> ApiResult<Json<PublishResponse>> {
    ensure_allowed(&state, &query)?;
    let document_id = ReverseSync::new(state.cms.clone(), state.stores.service())
        .publish_article(&id)
        .await?;
    Ok(Json(PublishResponse {
        success: true,
        document_id,
    }))
}

pub fn sync_routes() -> Router<ServerState> {
    Router::new()
        .route("/sync/blogs", get(sync_blogs))
        .route("/sync/events", get(sync_events))
        .route("/sync/articles/{id}/publish", post(publish_article))
}
