//! In-process content store, used for local development and tests.

use super::{ContentStore, DocumentFilter};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryContentStore {
    documents: Mutex<BTreeMap<String, Value>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_documents<T>(&self, f: impl FnOnce(&mut BTreeMap<String, Value>) -> Result<T>) -> Result<T> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| anyhow!("Content store mutex poisoned"))?;
        f(&mut documents)
    }
}

fn prepare(doc: Value) -> Result<(String, Value)> {
    let mut object: Map<String, Value> = match doc {
        Value::Object(object) => object,
        _ => bail!("Document must be a JSON object"),
    };
    let id = match object.get("_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = uuid::Uuid::new_v4().to_string();
            object.insert("_id".to_string(), Value::String(id.clone()));
            id
        }
    };
    let now = Value::String(Utc::now().to_rfc3339());
    object
        .entry("_createdAt".to_string())
        .or_insert_with(|| now.clone());
    object.insert("_updatedAt".to_string(), now);
    Ok((id, Value::Object(object)))
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn fetch(&self, filter: &DocumentFilter) -> Result<Vec<Value>> {
        self.with_documents(|docs| {
            Ok(docs
                .values()
                .filter(|doc| filter.matches(doc))
                .cloned()
                .collect())
        })
    }

    async fn get_document(&self, id: &str) -> Result<Option<Value>> {
        self.with_documents(|docs| Ok(docs.get(id).cloned()))
    }

    async fn create(&self, doc: Value) -> Result<Value> {
        let (id, doc) = prepare(doc)?;
        self.with_documents(|docs| {
            if docs.contains_key(&id) {
                bail!("Document {} already exists", id);
            }
            docs.insert(id, doc.clone());
            Ok(doc)
        })
    }

    async fn create_or_replace(&self, doc: Value) -> Result<Value> {
        let (id, mut doc) = prepare(doc)?;
        self.with_documents(|docs| {
            if let (Some(previous), Some(object)) = (docs.get(&id), doc.as_object_mut()) {
                if let Some(created) = previous.get("_createdAt") {
                    object.insert("_createdAt".to_string(), created.clone());
                }
            }
            docs.insert(id, doc.clone());
            Ok(doc)
        })
    }

    async fn patch(&self, id: &str, set: Value) -> Result<Value> {
        let fields = match set {
            Value::Object(fields) => fields,
            _ => bail!("Patch set must be a JSON object"),
        };
        self.with_documents(|docs| {
            let doc = docs
                .get_mut(id)
                .and_then(Value::as_object_mut)
                .ok_or_else(|| anyhow!("Document {} not found", id))?;
            for (key, value) in fields {
                doc.insert(key, value);
            }
            doc.insert(
                "_updatedAt".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
            Ok(Value::Object(doc.clone()))
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.with_documents(|docs| {
            docs.remove(id);
            Ok(())
        })
    }
}
