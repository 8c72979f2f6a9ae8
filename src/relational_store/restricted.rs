//! Anonymous-tier view over a relational store.
//!
//! Public request handlers only ever need to read published content and
//! manage the caller's own registrations, subscriptions and role requests.
//! Everything else is refused with [`StoreError::PermissionDenied`].

use super::models::*;
use super::{RelationalStore, StoreError, StoreResult};
use std::sync::Arc;

pub struct RestrictedStore {
    inner: Arc<dyn RelationalStore>,
}

impl RestrictedStore {
    pub fn new(inner: Arc<dyn RelationalStore>) -> Self {
        Self { inner }
    }
}

fn denied<T>(operation: &'static str) -> StoreResult<T> {
    Err(StoreError::PermissionDenied(operation))
}

impl RelationalStore for RestrictedStore {
    fn create_profile(&self, _profile: &NewProfile) -> StoreResult<Profile> {
        denied("create_profile")
    }

    fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        self.inner.get_profile(id)
    }

    fn oldest_admin(&self) -> StoreResult<Option<Profile>> {
        denied("oldest_admin")
    }

    fn profile_for_cms_user(&self, _cms_user_id: &str) -> StoreResult<Option<String>> {
        denied("profile_for_cms_user")
    }

    fn cms_user_for_profile(&self, _profile_id: &str) -> StoreResult<Option<String>> {
        denied("cms_user_for_profile")
    }

    fn link_author(&self, _profile_id: &str, _cms_user_id: &str) -> StoreResult<()> {
        denied("link_author")
    }

    fn create_series(
        &self,
        _sanity_id: Option<&str>,
        _title: &str,
        _slug: &str,
    ) -> StoreResult<String> {
        denied("create_series")
    }

    fn series_for_cms_id(&self, _sanity_id: &str) -> StoreResult<Option<String>> {
        denied("series_for_cms_id")
    }

    fn find_article_by_correlation(&self, _sanity_id: &str) -> StoreResult<Option<Article>> {
        denied("find_article_by_correlation")
    }

    fn get_article(&self, id: &str) -> StoreResult<Option<Article>> {
        self.inner.get_article(id)
    }

    fn insert_article(
        &self,
        _sanity_id: Option<&str>,
        _fields: &ArticleFields,
        _author_id: Option<&str>,
    ) -> StoreResult<Article> {
        denied("insert_article")
    }

    fn update_article(&self, _id: &str, _fields: &ArticleFields) -> StoreResult<Article> {
        denied("update_article")
    }

    fn set_article_status(&self, _id: &str, _status: &str) -> StoreResult<()> {
        denied("set_article_status")
    }

    fn set_article_back_reference(&self, _id: &str, _sanity_id: &str) -> StoreResult<()> {
        denied("set_article_back_reference")
    }

    fn find_event_by_correlation(&self, _sanity_id: &str) -> StoreResult<Option<Event>> {
        denied("find_event_by_correlation")
    }

    fn get_event(&self, id: &str) -> StoreResult<Option<Event>> {
        self.inner.get_event(id)
    }

    fn insert_event(&self, _sanity_id: Option<&str>, _fields: &EventFields) -> StoreResult<Event> {
        denied("insert_event")
    }

    fn update_event(&self, _id: &str, _fields: &EventFields) -> StoreResult<Event> {
        denied("update_event")
    }

    fn set_event_status(&self, _id: &str, _status: &str) -> StoreResult<()> {
        denied("set_event_status")
    }

    fn find_registration(
        &self,
        event_id: &str,
        email: &str,
    ) -> StoreResult<Option<Registration>> {
        self.inner.find_registration(event_id, email)
    }

    fn get_registration(&self, id: &str) -> StoreResult<Option<Registration>> {
        self.inner.get_registration(id)
    }

    fn create_registration(&self, registration: &NewRegistration) -> StoreResult<Registration> {
        self.inner.create_registration(registration)
    }

    fn cancel_registration(&self, id: &str) -> StoreResult<Registration> {
        self.inner.cancel_registration(id)
    }

    fn find_subscriber(&self, email: &str) -> StoreResult<Option<Subscriber>> {
        self.inner.find_subscriber(email)
    }

    fn insert_subscriber(&self, email: &str) -> StoreResult<Subscriber> {
        self.inner.insert_subscriber(email)
    }

    fn set_subscriber_unsubscribed_at(&self, email: &str, at: Option<i64>) -> StoreResult<()> {
        self.inner.set_subscriber_unsubscribed_at(email, at)
    }

    fn create_role_request(
        &self,
        user_id: &str,
        requested_role: ProfileRole,
        reason: Option<&str>,
    ) -> StoreResult<RoleRequest> {
        self.inner.create_role_request(user_id, requested_role, reason)
    }

    fn get_role_request(&self, id: &str) -> StoreResult<Option<RoleRequest>> {
        self.inner.get_role_request(id)
    }

    fn pending_role_request_for(&self, user_id: &str) -> StoreResult<Option<RoleRequest>> {
        self.inner.pending_role_request_for(user_id)
    }

    fn review_role_request(
        &self,
        _id: &str,
        _reviewer_id: &str,
        _decision: RoleRequestStatus,
        _feedback: Option<&str>,
    ) -> StoreResult<RoleRequest> {
        denied("review_role_request")
    }
}
