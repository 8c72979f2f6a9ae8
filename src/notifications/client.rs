//! HTTP client for the notification service.

use super::{Notification, Notifier};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub struct HttpNotifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationRequest<'a> {
    workflow: &'a str,
    to: &'a super::Recipient,
    subject: &'a str,
    payload: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    send_at: Option<String>,
}

impl<'a> NotificationRequest<'a> {
    fn new(notification: &'a Notification, send_at: Option<DateTime<Utc>>) -> Self {
        Self {
            workflow: &notification.workflow,
            to: &notification.recipient,
            subject: &notification.subject,
            payload: &notification.payload,
            send_at: send_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl HttpNotifier {
    pub fn new(base_url: String, api_key: String, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create notification HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn post(&self, request: &NotificationRequest<'_>) -> Result<()> {
        let url = format!("{}/v1/notifications", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .context("Failed to reach notification service")?;

        if !response.status().is_success() {
            bail!(
                "Notification service rejected {} with status {}",
                request.workflow,
                response.status()
            );
        }
        debug!("Notification {} accepted", request.workflow);
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        self.post(&NotificationRequest::new(notification, None))
            .await
    }

    async fn schedule(&self, notification: &Notification, send_at: DateTime<Utc>) -> Result<()> {
        self.post(&NotificationRequest::new(notification, Some(send_at)))
            .await
    }
}
