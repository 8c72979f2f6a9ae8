//! Test fixtures: seeded relational data, CMS documents and a notifier that
//! records what it was asked to send.

use super::constants::*;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use community_sync_server::notifications::{Notification, Notifier};
use community_sync_server::relational_store::{
    EventFields, NewProfile, ProfileRole, RelationalStore, SqliteRelationalStore,
};
use serde_json::{json, Value};
use std::sync::Mutex;

/// Ids of the profiles every test server starts with
pub struct SeededProfiles {
    pub admin_id: String,
    pub user_id: String,
}

pub fn seed_profiles(store: &SqliteRelationalStore) -> Result<SeededProfiles> {
    let admin = store.create_profile(&NewProfile {
        email: ADMIN_EMAIL.to_string(),
        full_name: Some("Site Admin".to_string()),
        role: ProfileRole::Admin,
    })?;
    let user = store.create_profile(&NewProfile {
        email: USER_EMAIL.to_string(),
        full_name: Some("Regular Member".to_string()),
        role: ProfileRole::User,
    })?;
    store.link_author(&admin.id, ADMIN_CMS_USER_ID)?;

    Ok(SeededProfiles {
        admin_id: admin.id,
        user_id: user.id,
    })
}

/// Inserts a published event directly into the relational store and returns
/// its id.
pub fn insert_event(
    store: &SqliteRelationalStore,
    start: DateTime<Utc>,
    capacity: Option<i64>,
) -> Result<String> {
    let event = store.insert_event(
        None,
        &EventFields {
            title: "Community Meetup".to_string(),
            slug: format!("meetup-{}", start.timestamp()),
            status: "published".to_string(),
            start_date: Some(start.to_rfc3339()),
            capacity,
            updated_at: Utc::now().to_rfc3339(),
            ..Default::default()
        },
    )?;
    Ok(event.id)
}

pub fn event_in_days(store: &SqliteRelationalStore, days: i64, capacity: Option<i64>) -> String {
    insert_event(store, Utc::now() + Duration::days(days), capacity)
        .expect("Failed to insert test event")
}

pub fn blog_document(id: &str, title: &str) -> Value {
    json!({
        "_id": id,
        "_type": "blog",
        "_createdAt": "2024-03-01T10:00:00Z",
        "_updatedAt": "2024-03-02T10:00:00Z",
        "title": title,
        "slug": {"current": title.to_lowercase().replace(' ', "-")},
        "author": {"_ref": ADMIN_CMS_USER_ID, "_type": "reference"},
        "content": [
            {"_type": "block", "children": [{"_type": "span", "text": "First paragraph."}]},
            {"_type": "block", "children": [{"_type": "span", "text": "Second paragraph."}]}
        ]
    })
}

pub fn event_document(id: &str, title: &str) -> Value {
    json!({
        "_id": id,
        "_type": "event",
        "_updatedAt": "2024-03-02T10:00:00Z",
        "title": title,
        "slug": {"current": title.to_lowercase().replace(' ', "-")},
        "startDate": "2030-05-01",
        "location": {"name": "Town Hall"},
        "capacity": 50,
        "description": "Bring snacks."
    })
}

/// What the server asked the notification service to do
#[derive(Debug, Clone)]
pub enum SentNotification {
    Immediate(Notification),
    Scheduled(Notification, DateTime<Utc>),
}

/// Notifier that keeps every request in memory
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn immediate(&self) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter_map(|n| match n {
                SentNotification::Immediate(notification) => Some(notification),
                _ => None,
            })
            .collect()
    }

    pub fn scheduled(&self) -> Vec<(Notification, DateTime<Utc>)> {
        self.sent()
            .into_iter()
            .filter_map(|n| match n {
                SentNotification::Scheduled(notification, at) => Some((notification, at)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(SentNotification::Immediate(notification.clone()));
        Ok(())
    }

    async fn schedule(&self, notification: &Notification, send_at: DateTime<Utc>) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(SentNotification::Scheduled(notification.clone(), send_at));
        Ok(())
    }
}
