//! Content store (headless CMS) access.
//!
//! Documents are kept as raw JSON values: the CMS schema is owned by the CMS
//! and only the sync layer knows which fields it cares about.

mod client;
mod memory;

pub use client::HttpContentStore;
pub use memory::InMemoryContentStore;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub const DRAFT_PREFIX: &str = "drafts.";

pub fn is_draft_id(id: &str) -> bool {
    id.starts_with(DRAFT_PREFIX)
}

/// Selects documents of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFilter {
    pub doc_type: String,
    /// Excludes draft ids and documents whose `status` is set to anything
    /// other than `published`.
    pub published_only: bool,
}

impl DocumentFilter {
    pub fn published(doc_type: &str) -> Self {
        Self {
            doc_type: doc_type.to_string(),
            published_only: true,
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        if doc.get("_type").and_then(Value::as_str) != Some(self.doc_type.as_str()) {
            return false;
        }
        if !self.published_only {
            return true;
        }
        let id = doc.get("_id").and_then(Value::as_str).unwrap_or_default();
        let status_ok = match doc.get("status").and_then(Value::as_str) {
            None => true,
            Some(status) => status == "published",
        };
        !is_draft_id(id) && status_ok
    }

    /// GROQ expression equivalent to [`DocumentFilter::matches`].
    pub fn to_groq(&self) -> String {
        let doc_type: String = self
            .doc_type
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if self.published_only {
            format!(
                "*[_type == \"{}\" && !(_id in path(\"drafts.**\")) && (!defined(status) || status == \"published\")]",
                doc_type
            )
        } else {
            format!("*[_type == \"{}\"]", doc_type)
        }
    }
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch(&self, filter: &DocumentFilter) -> Result<Vec<Value>>;

    async fn get_document(&self, id: &str) -> Result<Option<Value>>;

    /// Creates a document, failing if its `_id` already exists.
    async fn create(&self, doc: Value) -> Result<Value>;

    /// Upsert keyed by the document's `_id`.
    async fn create_or_replace(&self, doc: Value) -> Result<Value>;

    /// Sets the given top-level fields on an existing document.
    async fn patch(&self, id: &str, set: Value) -> Result<Value>;

    async fn delete(&self, id: &str) -> Result<()>;
}
