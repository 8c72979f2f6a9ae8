//! Relational side of the system: the records that mirror CMS documents plus
//! the relational-only state (registrations, subscribers, role requests).

mod models;
mod restricted;
mod schema;
mod sqlite_store;

pub use models::*;
pub use restricted::RestrictedStore;
pub use schema::COMMUNITY_VERSIONED_SCHEMAS;
pub use sqlite_store::SqliteRelationalStore;

use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write. Carries the id of the row that
    /// already holds the key when it could be determined.
    #[error("Record already exists")]
    Conflict { existing_id: Option<String> },

    #[error("Event has reached its capacity")]
    CapacityReached,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Operation {0} requires service access")]
    PermissionDenied(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Credential tier a caller holds on the relational store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    /// Public, end-user facing operations only.
    Anonymous,
    /// Unrestricted access, used by sync handlers and administrative flows.
    Service,
}

pub trait RelationalStore: Send + Sync {
    // Profiles
    fn create_profile(&self, profile: &NewProfile) -> StoreResult<Profile>;
    fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>>;
    /// The earliest created admin profile, used as the last-resort author.
    fn oldest_admin(&self) -> StoreResult<Option<Profile>>;

    // Author links (profile <-> CMS user document)
    fn profile_for_cms_user(&self, cms_user_id: &str) -> StoreResult<Option<String>>;
    fn cms_user_for_profile(&self, profile_id: &str) -> StoreResult<Option<String>>;
    /// Records or replaces the link of `profile_id`.
    fn link_author(&self, profile_id: &str, cms_user_id: &str) -> StoreResult<()>;

    // Series
    fn create_series(&self, sanity_id: Option<&str>, title: &str, slug: &str)
        -> StoreResult<String>;
    fn series_for_cms_id(&self, sanity_id: &str) -> StoreResult<Option<String>>;

    // Articles
    fn find_article_by_correlation(&self, sanity_id: &str) -> StoreResult<Option<Article>>;
    fn get_article(&self, id: &str) -> StoreResult<Option<Article>>;
    fn insert_article(
        &self,
        sanity_id: Option<&str>,
        fields: &ArticleFields,
        author_id: Option<&str>,
    ) -> StoreResult<Article>;
    fn update_article(&self, id: &str, fields: &ArticleFields) -> StoreResult<Article>;
    fn set_article_status(&self, id: &str, status: &str) -> StoreResult<()>;
    /// Sets the correlation key and marks the article published. Idempotent.
    fn set_article_back_reference(&self, id: &str, sanity_id: &str) -> StoreResult<()>;

    // Events
    fn find_event_by_correlation(&self, sanity_id: &str) -> StoreResult<Option<Event>>;
    fn get_event(&self, id: &str) -> StoreResult<Option<Event>>;
    fn insert_event(&self, sanity_id: Option<&str>, fields: &EventFields) -> StoreResult<Event>;
    fn update_event(&self, id: &str, fields: &EventFields) -> StoreResult<Event>;
    fn set_event_status(&self, id: &str, status: &str) -> StoreResult<()>;

    // Registrations
    fn find_registration(&self, event_id: &str, email: &str)
        -> StoreResult<Option<Registration>>;
    fn get_registration(&self, id: &str) -> StoreResult<Option<Registration>>;
    /// Inserts a confirmed registration and bumps the event's registration
    /// count in one transaction.
    fn create_registration(&self, registration: &NewRegistration) -> StoreResult<Registration>;
    fn cancel_registration(&self, id: &str) -> StoreResult<Registration>;

    // Subscribers
    fn find_subscriber(&self, email: &str) -> StoreResult<Option<Subscriber>>;
    fn insert_subscriber(&self, email: &str) -> StoreResult<Subscriber>;
    /// `None` re-activates the subscription, `Some(ts)` unsubscribes at `ts`.
    fn set_subscriber_unsubscribed_at(&self, email: &str, at: Option<i64>) -> StoreResult<()>;

    // Role requests
    fn create_role_request(
        &self,
        user_id: &str,
        requested_role: ProfileRole,
        reason: Option<&str>,
    ) -> StoreResult<RoleRequest>;
    fn get_role_request(&self, id: &str) -> StoreResult<Option<RoleRequest>>;
    fn pending_role_request_for(&self, user_id: &str) -> StoreResult<Option<RoleRequest>>;
    /// Applies the decision and, when approved, the role change atomically.
    /// Fails with `InvalidState` when the request is no longer pending.
    fn review_role_request(
        &self,
        id: &str,
        reviewer_id: &str,
        decision: RoleRequestStatus,
        feedback: Option<&str>,
    ) -> StoreResult<RoleRequest>;
}

/// Hands out store handles for each access tier.
#[derive(Clone)]
pub struct TieredStore {
    service: Arc<dyn RelationalStore>,
    anonymous: Arc<dyn RelationalStore>,
}

impl TieredStore {
    pub fn new(service: Arc<dyn RelationalStore>) -> Self {
        let anonymous = Arc::new(RestrictedStore::new(service.clone()));
        Self { service, anonymous }
    }

    pub fn tier(&self, tier: AccessTier) -> Arc<dyn RelationalStore> {
        match tier {
            AccessTier::Anonymous => self.anonymous.clone(),
            AccessTier::Service => self.service.clone(),
        }
    }

    pub fn service(&self) -> Arc<dyn RelationalStore> {
        self.tier(AccessTier::Service)
    }

    pub fn anonymous(&self) -> Arc<dyn RelationalStore> {
        self.tier(AccessTier::Anonymous)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
