//! Bulk CMS → relational synchronization.

use super::{SyncAction, SyncError, SyncTarget};
use crate::cms::{ContentStore, DocumentFilter};
use crate::relational_store::RelationalStore;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchItemStatus {
    Created,
    Updated,
    Error,
}

impl BatchItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchItemStatus::Created => "created",
            BatchItemStatus::Updated => "updated",
            BatchItemStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub id: String,
    pub title: Option<String>,
    pub status: BatchItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub success: bool,
    pub message: String,
    pub total: usize,
    pub results: Vec<BatchItem>,
}

impl BatchReport {
    fn from_results(results: Vec<BatchItem>) -> Self {
        let total = results.len();
        let ok = results
            .iter()
            .filter(|item| item.status != BatchItemStatus::Error)
            .count();
        Self {
            success: ok == total,
            message: format!("Synced {} of {} documents", ok, total),
            total,
            results,
        }
    }
}

/// Decides who may trigger batch and reverse sync runs.
#[derive(Debug, Clone)]
pub struct BatchGate {
    production: bool,
    admin_key: Option<String>,
}

impl BatchGate {
    pub fn new(production: bool, admin_key: Option<String>) -> Self {
        Self {
            production,
            admin_key: admin_key.filter(|k| !k.is_empty()),
        }
    }

    /// Outside production anyone may run a batch. In production the caller
    /// must present the admin key, and with no key configured nobody can.
    pub fn allows(&self, provided_key: Option<&str>) -> bool {
        if !self.production {
            return true;
        }
        match (&self.admin_key, provided_key) {
            (Some(expected), Some(provided)) => {
                bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
            }
            _ => false,
        }
    }
}

/// Re-applies every published CMS document of the target's type. A failing
/// document is reported and does not stop the run.
pub async fn sync_all(
    target: &dyn SyncTarget,
    cms: &dyn ContentStore,
    store: &dyn RelationalStore,
) -> Result<BatchReport, SyncError> {
    let documents = cms
        .fetch(&DocumentFilter::published(target.doc_type()))
        .await
        .map_err(SyncError::ContentStore)?;
    info!(
        "Batch sync of {} {} documents",
        documents.len(),
        target.doc_type()
    );

    let now = Utc::now();
    let results = documents
        .iter()
        .map(|doc| {
            let id = doc
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let title = doc.get("title").and_then(Value::as_str).map(str::to_string);

            let outcome = if id.is_empty() {
                Err(SyncError::InvalidPayload("Document has no id".to_string()))
            } else {
                target.upsert(store, &id, doc, now)
            };

            match outcome {
                Ok(outcome) => BatchItem {
                    id,
                    title,
                    status: match outcome.action {
                        SyncAction::Created => BatchItemStatus::Created,
                        _ => BatchItemStatus::Updated,
                    },
                    message: None,
                },
                Err(err) => {
                    warn!("Batch sync of {} {} failed: {}", target.entity(), id, err);
                    BatchItem {
                        id,
                        title,
                        status: BatchItemStatus::Error,
                        message: Some(err.to_string()),
                    }
                }
            }
        })
        .collect();

    Ok(BatchReport::from_results(results))
}
