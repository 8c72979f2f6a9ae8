//! End-user operations that live only in the relational store: event
//! registrations, newsletter subscriptions and role requests.

mod newsletter;
mod registration;
mod role_requests;

pub use newsletter::{subscribe, unsubscribe, SubscribeOutcome, UnsubscribeOutcome};
pub use registration::{EventRegistrations, RegistrationRequest};
pub use role_requests::{review_role_request, submit_role_request, ReviewRequest, RoleRequestSubmission};

use crate::relational_store::StoreError;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommunityError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// The write collides with an existing record, identified by
    /// `existing_id` when known.
    #[error("{message}")]
    Conflict {
        message: String,
        existing_id: Option<String>,
    },

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex");
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

/// Trimmed, non-empty value of an optional request field.
fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
