//! Notification data models and message formatting

use crate::relational_store::{Event, Registration};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const REGISTRATION_CONFIRMATION_WORKFLOW: &str = "event-registration-confirmation";
pub const EVENT_REMINDER_WORKFLOW: &str = "event-reminder";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// A message handed to the notification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub workflow: String,
    pub recipient: Recipient,
    pub subject: String,
    pub payload: serde_json::Value,
}

fn recipient(registration: &Registration) -> Recipient {
    Recipient {
        email: registration.email.clone(),
        name: registration.name.clone(),
    }
}

pub fn registration_confirmation(event: &Event, registration: &Registration) -> Notification {
    Notification {
        workflow: REGISTRATION_CONFIRMATION_WORKFLOW.to_string(),
        recipient: recipient(registration),
        subject: format!("Registration confirmed: {}", event.title),
        payload: json!({
            "registrationId": registration.id,
            "name": registration.name,
            "eventId": event.id,
            "eventTitle": event.title,
            "eventSlug": event.slug,
            "startDate": event.start_date,
            "location": event.location,
        }),
    }
}

pub fn event_reminder(event: &Event, registration: &Registration, hours_before: u32) -> Notification {
    let unit = if hours_before == 1 { "hour" } else { "hours" };
    Notification {
        workflow: EVENT_REMINDER_WORKFLOW.to_string(),
        recipient: recipient(registration),
        subject: format!("Reminder: {} starts in {} {}", event.title, hours_before, unit),
        payload: json!({
            "registrationId": registration.id,
            "name": registration.name,
            "eventId": event.id,
            "eventTitle": event.title,
            "eventSlug": event.slug,
            "startDate": event.start_date,
            "location": event.location,
            "hoursBefore": hours_before,
        }),
    }
}

/// Send times for reminders `offsets_hours` before `start`, dropping the ones
/// already in the past.
pub fn reminder_schedule(
    start: DateTime<Utc>,
    offsets_hours: &[u32],
    now: DateTime<Utc>,
) -> Vec<(u32, DateTime<Utc>)> {
    offsets_hours
        .iter()
        .map(|hours| (*hours, start - Duration::hours(i64::from(*hours))))
        .filter(|(_, send_at)| *send_at > now)
        .collect()
}
