use super::{is_valid_email, required, CommunityError};
use crate::notifications::{event_reminder, registration_confirmation, reminder_schedule, Notifier};
use crate::relational_store::{
    normalize_email, Event, NewRegistration, RelationalStore, Registration, StoreError,
};
use crate::server::metrics;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

const EVENT_FULL: &str = "Event is full";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub event_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub attendee_details: Option<serde_json::Value>,
}

fn already_registered(existing_id: Option<String>) -> CommunityError {
    CommunityError::Conflict {
        message: "Already registered for this event".to_string(),
        existing_id,
    }
}

fn event_not_found() -> CommunityError {
    CommunityError::NotFound("Event not found".to_string())
}

pub struct EventRegistrations {
    store: Arc<dyn RelationalStore>,
    notifier: Arc<dyn Notifier>,
    reminder_offsets_hours: Vec<u32>,
}

impl EventRegistrations {
    pub fn new(
        store: Arc<dyn RelationalStore>,
        notifier: Arc<dyn Notifier>,
        reminder_offsets_hours: Vec<u32>,
    ) -> Self {
        Self {
            store,
            notifier,
            reminder_offsets_hours,
        }
    }

    pub async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<Registration, CommunityError> {
        let (event_id, name, email) = match (
            required(&request.event_id),
            required(&request.name),
            required(&request.email),
        ) {
            (Some(event_id), Some(name), Some(email)) => (event_id, name, email),
            _ => {
                return Err(CommunityError::Validation(
                    "Missing required fields".to_string(),
                ))
            }
        };
        if !is_valid_email(email) {
            return Err(CommunityError::Validation(
                "Invalid email address".to_string(),
            ));
        }

        let event = self.store.get_event(event_id)?.ok_or_else(event_not_found)?;
        if !event.accepts_registrations() {
            return Err(CommunityError::Validation(
                "Event is not accepting registrations".to_string(),
            ));
        }
        if let Some(existing) = self.store.find_registration(&event.id, email)? {
            return Err(already_registered(Some(existing.id)));
        }
        if let Some(capacity) = event.capacity {
            if event.registration_count >= capacity {
                return Err(CommunityError::Validation(EVENT_FULL.to_string()));
            }
        }

        let new_registration = NewRegistration {
            event_id: event.id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            company: required(&request.company).map(str::to_string),
            attendee_details: request.attendee_details.clone(),
        };
        let registration = match self.store.create_registration(&new_registration) {
            Ok(registration) => registration,
            Err(StoreError::Conflict { existing_id }) => {
                return Err(already_registered(existing_id))
            }
            Err(StoreError::CapacityReached) => {
                return Err(CommunityError::Validation(EVENT_FULL.to_string()))
            }
            Err(StoreError::NotFound(_)) => return Err(event_not_found()),
            Err(e) => return Err(e.into()),
        };
        info!(
            "Registration {} created for event {}",
            registration.id, event.id
        );

        self.notify(&event, &registration).await;
        Ok(registration)
    }

    /// Cancels a confirmed registration. The caller proves ownership with the
    /// email used to register.
    pub fn cancel(&self, registration_id: &str, email: &str) -> Result<Registration, CommunityError> {
        let not_found = || CommunityError::NotFound("Registration not found".to_string());
        let registration = self
            .store
            .get_registration(registration_id)?
            .ok_or_else(not_found)?;
        if registration.email != normalize_email(email) {
            return Err(not_found());
        }

        match self.store.cancel_registration(&registration.id) {
            Ok(cancelled) => Ok(cancelled),
            Err(StoreError::InvalidState(message)) => Err(CommunityError::Validation(message)),
            Err(StoreError::NotFound(_)) => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best effort: failures are logged and counted, never surfaced.
    async fn notify(&self, event: &Event, registration: &Registration) {
        let confirmation = registration_confirmation(event, registration);
        if let Err(e) = self.notifier.send(&confirmation).await {
            warn!(
                "Failed to send confirmation for registration {}: {:#}",
                registration.id, e
            );
            metrics::record_notification_failure(&confirmation.workflow);
        }

        let start = match event
            .start_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        {
            Some(start) => start.with_timezone(&Utc),
            None => return,
        };

        let reminders: Vec<_> = reminder_schedule(start, &self.reminder_offsets_hours, Utc::now())
            .into_iter()
            .map(|(hours, send_at)| (event_reminder(event, registration, hours), send_at))
            .collect();
        let results = join_all(
            reminders
                .iter()
                .map(|(reminder, send_at)| self.notifier.schedule(reminder, *send_at)),
        )
        .await;
        for ((reminder, send_at), result) in reminders.iter().zip(results) {
            if let Err(e) = result {
                warn!(
                    "Failed to schedule reminder at {} for registration {}: {:#}",
                    send_at, registration.id, e
                );
                metrics::record_notification_failure(&reminder.workflow);
            }
        }
    }
}
