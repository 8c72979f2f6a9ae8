//! Synchronization between the CMS and the relational store.
//!
//! CMS → relational runs through [`SyncTarget`] implementations, one per
//! mirrored entity, driven either by webhooks or by batch runs. Relational →
//! CMS only exists for articles ([`ReverseSync`]).

mod author;
mod batch;
mod payload;
mod reverse;
mod signature;
mod webhook;

pub use author::resolve_author;
pub use batch::{sync_all, BatchGate, BatchItem, BatchItemStatus, BatchReport};
pub use payload::{
    body_text, flatten_blocks, normalize_article, normalize_event, normalize_timestamp,
    NormalizedArticle, Operation, WebhookPayload,
};
pub use reverse::{ReverseSync, ReverseSyncError};
pub use signature::{sign, SignatureError, SignaturePolicy, SIGNATURE_HEADER};
pub use webhook::handle_webhook;

use crate::relational_store::{RelationalStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Content store error: {0:#}")]
    ContentStore(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Created,
    Updated,
    Deleted,
    Ignored,
}

impl SyncAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncAction::Created => "created",
            SyncAction::Updated => "updated",
            SyncAction::Deleted => "deleted",
            SyncAction::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub action: SyncAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncOutcome {
    fn applied(action: SyncAction, id: String) -> Self {
        Self {
            action,
            id: Some(id),
            message: None,
        }
    }

    pub fn ignored(message: impl Into<String>) -> Self {
        Self {
            action: SyncAction::Ignored,
            id: None,
            message: Some(message.into()),
        }
    }
}

/// One mirrored entity type.
pub trait SyncTarget: Send + Sync {
    /// CMS `_type` this target mirrors.
    fn doc_type(&self) -> &'static str;

    /// Entity label used in logs and metrics.
    fn entity(&self) -> &'static str;

    /// Creates or updates the relational record correlated with `sanity_id`.
    fn upsert(
        &self,
        store: &dyn RelationalStore,
        sanity_id: &str,
        doc: &Value,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError>;

    /// Flags the correlated record as removed. Unknown ids are a no-op.
    fn mark_deleted(
        &self,
        store: &dyn RelationalStore,
        sanity_id: &str,
    ) -> Result<SyncOutcome, SyncError>;
}

pub struct ArticleSync {
    fallback_author_id: Option<String>,
}

impl ArticleSync {
    pub const DELETED_STATUS: &'static str = "deleted";

    pub fn new(fallback_author_id: Option<String>) -> Self {
        Self { fallback_author_id }
    }
}

impl SyncTarget for ArticleSync {
    fn doc_type(&self) -> &'static str {
        "blog"
    }

    fn entity(&self) -> &'static str {
        "article"
    }

    fn upsert(
        &self,
        store: &dyn RelationalStore,
        sanity_id: &str,
        doc: &Value,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        let normalized = normalize_article(doc, now)?;
        let mut fields = normalized.fields;
        fields.series_id = match normalized.series_ref.as_deref() {
            Some(series_ref) => store.series_for_cms_id(series_ref)?,
            None => None,
        };

        if let Some(existing) = store.find_article_by_correlation(sanity_id)? {
            store.update_article(&existing.id, &fields)?;
            debug!("Updated article {} from {}", existing.id, sanity_id);
            return Ok(SyncOutcome::applied(SyncAction::Updated, existing.id));
        }

        let author_id = resolve_author(
            store,
            normalized.author_ref.as_deref(),
            self.fallback_author_id.as_deref(),
        )?;
        match store.insert_article(Some(sanity_id), &fields, author_id.as_deref()) {
            Ok(article) => {
                info!("Created article {} from {}", article.id, sanity_id);
                Ok(SyncOutcome::applied(SyncAction::Created, article.id))
            }
            // Lost a race with a concurrent delivery for the same document.
            Err(StoreError::Conflict {
                existing_id: Some(existing_id),
            }) => {
                store.update_article(&existing_id, &fields)?;
                Ok(SyncOutcome::applied(SyncAction::Updated, existing_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn mark_deleted(
        &self,
        store: &dyn RelationalStore,
        sanity_id: &str,
    ) -> Result<SyncOutcome, SyncError> {
        match store.find_article_by_correlation(sanity_id)? {
            Some(article) => {
                store.set_article_status(&article.id, Self::DELETED_STATUS)?;
                info!("Marked article {} as deleted", article.id);
                Ok(SyncOutcome::applied(SyncAction::Deleted, article.id))
            }
            None => Ok(SyncOutcome::ignored("No matching article")),
        }
    }
}

pub struct EventSync;

impl EventSync {
    pub const DELETED_STATUS: &'static str = "cancelled";
}

impl SyncTarget for EventSync {
    fn doc_type(&self) -> &'static str {
        "event"
    }

    fn entity(&self) -> &'static str {
        "event"
    }

    fn upsert(
        &self,
        store: &dyn RelationalStore,
        sanity_id: &str,
        doc: &Value,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        let fields = normalize_event(doc, now)?;

        if let Some(existing) = store.find_event_by_correlation(sanity_id)? {
            store.update_event(&existing.id, &fields)?;
            debug!("Updated event {} from {}", existing.id, sanity_id);
            return Ok(SyncOutcome::applied(SyncAction::Updated, existing.id));
        }

        match store.insert_event(Some(sanity_id), &fields) {
            Ok(event) => {
                info!("Created event {} from {}", event.id, sanity_id);
                Ok(SyncOutcome::applied(SyncAction::Created, event.id))
            }
            Err(StoreError::Conflict {
                existing_id: Some(existing_id),
            }) => {
                store.update_event(&existing_id, &fields)?;
                Ok(SyncOutcome::applied(SyncAction::Updated, existing_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn mark_deleted(
        &self,
        store: &dyn RelationalStore,
        sanity_id: &str,
    ) -> Result<SyncOutcome, SyncError> {
        match store.find_event_by_correlation(sanity_id)? {
            Some(event) => {
                store.set_event_status(&event.id, Self::DELETED_STATUS)?;
                info!("Marked event {} as cancelled", event.id);
                Ok(SyncOutcome::applied(SyncAction::Deleted, event.id))
            }
            None => Ok(SyncOutcome::ignored("No matching event")),
        }
    }
}
