//! Outbound notifications (transactional email through an external service)

mod client;
mod models;

pub use client::HttpNotifier;
pub use models::{
    event_reminder, registration_confirmation, reminder_schedule, Notification, Recipient,
    EVENT_REMINDER_WORKFLOW, REGISTRATION_CONFIRMATION_WORKFLOW,
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;

    async fn schedule(&self, notification: &Notification, send_at: DateTime<Utc>) -> Result<()>;
}

/// Used when no notification service is configured.
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        debug!(
            "Notifications disabled, dropping {} for {}",
            notification.workflow, notification.recipient.email
        );
        Ok(())
    }

    async fn schedule(&self, notification: &Notification, send_at: DateTime<Utc>) -> Result<()> {
        debug!(
            "Notifications disabled, dropping {} for {} at {}",
            notification.workflow, notification.recipient.email, send_at
        );
        Ok(())
    }
}
