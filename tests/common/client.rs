//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all community-sync-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use community_sync_server::sync::{sign, SIGNATURE_HEADER};
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(&self, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Health
    // ========================================================================

    pub async fn get_home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Webhooks
    // ========================================================================

    /// Posts a webhook signed with the test server's secret
    pub async fn send_webhook(&self, entity: &str, payload: &Value) -> Response {
        let body = payload.to_string();
        let signature = sign(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), body.as_bytes());
        self.send_raw_webhook(entity, body, Some(signature)).await
    }

    pub async fn send_raw_webhook(
        &self,
        entity: &str,
        body: String,
        signature: Option<String>,
    ) -> Response {
        let mut request = self
            .client
            .post(self.url(&format!("/api/webhooks/{}", entity)))
            .header("content-type", "application/json")
            .body(body);
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        request.send().await.expect("Webhook request failed")
    }

    // ========================================================================
    // Sync
    // ========================================================================

    fn with_key(path: String, key: Option<&str>) -> String {
        match key {
            Some(key) => format!("{}?key={}", path, urlencoding::encode(key)),
            None => path,
        }
    }

    pub async fn sync_all(&self, kind: &str, key: Option<&str>) -> Response {
        let path = Self::with_key(format!("/api/sync/{}", kind), key);
        self.client
            .get(self.url(&path))
            .send()
            .await
            .expect("Sync request failed")
    }

    pub async fn publish_article(&self, article_id: &str, key: Option<&str>) -> Response {
        let path = Self::with_key(format!("/api/sync/articles/{}/publish", article_id), key);
        self.client
            .post(self.url(&path))
            .send()
            .await
            .expect("Publish request failed")
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub async fn register(&self, event_id: &str, name: &str, email: &str) -> Response {
        self.post_json(
            "/api/events/register",
            json!({ "eventId": event_id, "name": name, "email": email }),
        )
        .await
    }

    pub async fn register_with(&self, body: Value) -> Response {
        self.post_json("/api/events/register", body).await
    }

    pub async fn cancel_registration(&self, registration_id: &str, email: &str) -> Response {
        self.post_json(
            &format!("/api/events/registrations/{}/cancel", registration_id),
            json!({ "email": email }),
        )
        .await
    }

    // ========================================================================
    // Newsletter
    // ========================================================================

    pub async fn subscribe(&self, email: &str) -> Response {
        self.post_json("/api/newsletter/subscribe", json!({ "email": email }))
            .await
    }

    pub async fn unsubscribe(&self, email: &str) -> Response {
        self.post_json("/api/newsletter/unsubscribe", json!({ "email": email }))
            .await
    }

    // ========================================================================
    // Role Requests
    // ========================================================================

    pub async fn submit_role_request(&self, user_id: &str, role: &str) -> Response {
        self.post_json(
            "/api/admin-requests",
            json!({ "userId": user_id, "requestedRole": role, "reason": "Happy to help" }),
        )
        .await
    }

    pub async fn review_role_request(
        &self,
        request_id: &str,
        admin_id: &str,
        status: &str,
    ) -> Response {
        self.post_json(
            "/api/admin-requests/review",
            json!({ "requestId": request_id, "adminId": admin_id, "status": status }),
        )
        .await
    }
}
