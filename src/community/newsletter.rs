use super::{is_valid_email, CommunityError};
use crate::relational_store::{RelationalStore, StoreError};
use chrono::Utc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    Resubscribed,
}

impl SubscribeOutcome {
    pub fn message(self) -> &'static str {
        match self {
            SubscribeOutcome::Subscribed => "Successfully subscribed",
            SubscribeOutcome::Resubscribed => "Successfully re-subscribed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed,
    AlreadyUnsubscribed,
}

impl UnsubscribeOutcome {
    pub fn message(self) -> &'static str {
        match self {
            UnsubscribeOutcome::Unsubscribed => "Successfully unsubscribed",
            UnsubscribeOutcome::AlreadyUnsubscribed => "Email already unsubscribed",
        }
    }
}

fn already_subscribed() -> CommunityError {
    CommunityError::Conflict {
        message: "Email already subscribed".to_string(),
        existing_id: None,
    }
}

pub fn subscribe(
    store: &dyn RelationalStore,
    email: &str,
) -> Result<SubscribeOutcome, CommunityError> {
    if !is_valid_email(email) {
        return Err(CommunityError::Validation(
            "Invalid email address".to_string(),
        ));
    }

    match store.find_subscriber(email)? {
        Some(subscriber) if subscriber.is_active() => Err(already_subscribed()),
        Some(subscriber) => {
            store.set_subscriber_unsubscribed_at(&subscriber.email, None)?;
            info!("Re-subscribed {}", subscriber.email);
            Ok(SubscribeOutcome::Resubscribed)
        }
        None => match store.insert_subscriber(email) {
            Ok(subscriber) => {
                info!("New newsletter subscriber {}", subscriber.id);
                Ok(SubscribeOutcome::Subscribed)
            }
            Err(StoreError::Conflict { .. }) => Err(already_subscribed()),
            Err(e) => Err(e.into()),
        },
    }
}

pub fn unsubscribe(
    store: &dyn RelationalStore,
    email: &str,
) -> Result<UnsubscribeOutcome, CommunityError> {
    if !is_valid_email(email) {
        return Err(CommunityError::Validation(
            "Invalid email address".to_string(),
        ));
    }

    let subscriber = store
        .find_subscriber(email)?
        .ok_or_else(|| CommunityError::NotFound("Email not found".to_string()))?;
    if !subscriber.is_active() {
        return Ok(UnsubscribeOutcome::AlreadyUnsubscribed);
    }

    store.set_subscriber_unsubscribed_at(&subscriber.email, Some(Utc::now().timestamp()))?;
    Ok(UnsubscribeOutcome::Unsubscribed)
}
