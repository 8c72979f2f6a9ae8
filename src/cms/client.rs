//! HTTP client for the CMS query and mutation API.

use super::{ContentStore, DocumentFilter};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub struct HttpContentStore {
    client: reqwest::Client,
    base_url: String,
    dataset: String,
    api_version: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: Value,
}

#[derive(Deserialize)]
struct DocumentsResponse {
    #[serde(default)]
    documents: Vec<Value>,
}

#[derive(Deserialize)]
struct MutationResult {
    #[serde(default)]
    document: Option<Value>,
}

#[derive(Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutationResult>,
}

impl HttpContentStore {
    /// # Arguments
    /// * `base_url` - Project API root (e.g. "https://abc123.api.sanity.io")
    /// * `dataset` - Dataset name
    /// * `api_version` - Dated API version, without the leading `v`
    /// * `token` - Bearer token; required for mutations and private datasets
    pub fn new(
        base_url: String,
        dataset: String,
        api_version: String,
        token: Option<String>,
        timeout_sec: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create CMS HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let api_version = api_version.trim_start_matches('v').to_string();

        Ok(Self {
            client,
            base_url,
            dataset,
            api_version,
            token,
        })
    }

    fn endpoint(&self, kind: &str) -> String {
        format!(
            "{}/v{}/data/{}/{}",
            self.base_url, self.api_version, kind, self.dataset
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn mutate(&self, mutation: Value, fallback: Value) -> Result<Value> {
        let url = format!("{}?returnDocuments=true", self.endpoint("mutate"));
        let response = self
            .authorized(self.client.post(&url))
            .json(&json!({ "mutations": [mutation] }))
            .send()
            .await
            .context("Failed to send mutation to CMS")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("CMS mutation failed with status {}: {}", status, body);
        }

        let parsed: MutateResponse = response
            .json()
            .await
            .context("Failed to parse CMS mutation response")?;
        Ok(parsed
            .results
            .into_iter()
            .next()
            .and_then(|r| r.document)
            .unwrap_or(fallback))
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn fetch(&self, filter: &DocumentFilter) -> Result<Vec<Value>> {
        let query = filter.to_groq();
        let url = format!(
            "{}?query={}",
            self.endpoint("query"),
            urlencoding::encode(&query)
        );
        debug!("CMS query: {}", query);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .context("Failed to query CMS")?;

        if !response.status().is_success() {
            bail!("CMS query failed with status {}", response.status());
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .context("Failed to parse CMS query response")?;
        match parsed.result {
            Value::Array(docs) => Ok(docs),
            Value::Null => Ok(vec![]),
            other => bail!("Unexpected CMS query result: {}", other),
        }
    }

    async fn get_document(&self, id: &str) -> Result<Option<Value>> {
        let url = format!("{}/{}", self.endpoint("doc"), urlencoding::encode(id));
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .with_context(|| format!("Failed to fetch CMS document {}", id))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!(
                "Failed to fetch CMS document {}: status {}",
                id,
                response.status()
            );
        }

        let parsed: DocumentsResponse = response
            .json()
            .await
            .context("Failed to parse CMS document response")?;
        Ok(parsed.documents.into_iter().next())
    }

    async fn create(&self, doc: Value) -> Result<Value> {
        self.mutate(json!({ "create": doc.clone() }), doc).await
    }

    async fn create_or_replace(&self, doc: Value) -> Result<Value> {
        self.mutate(json!({ "createOrReplace": doc.clone() }), doc)
            .await
    }

    async fn patch(&self, id: &str, set: Value) -> Result<Value> {
        let fallback = json!({ "_id": id });
        self.mutate(json!({ "patch": { "id": id, "set": set } }), fallback)
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.mutate(json!({ "delete": { "id": id } }), Value::Null)
            .await
            .map(|_| ())
    }
}
