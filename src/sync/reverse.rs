//! Relational → CMS publishing of articles.
//!
//! Documents created here use deterministic ids (`article-<id>`,
//! `user-<profileId>`), so repeated runs replace instead of duplicating.

use crate::cms::ContentStore;
use crate::relational_store::{Article, RelationalStore, StoreError};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ReverseSyncError {
    #[error("Article {0} not found")]
    ArticleNotFound(String),

    #[error("CMS document {0} does not exist")]
    DocumentMissing(String),

    /// The article mirrors a document authored in the CMS. Publishing it
    /// would fork the content and cut the webhook correlation.
    #[error("Article {article_id} is already backed by CMS document {document_id}")]
    AlreadyInCms {
        article_id: String,
        document_id: String,
    },

    #[error("Content store error: {0:#}")]
    ContentStore(anyhow::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The CMS document was written but the article could not be pointed at
    /// it. Retry with [`ReverseSync::reconcile`].
    #[error("CMS document {document_id} written but back-reference failed: {source}")]
    BackReference {
        document_id: String,
        source: StoreError,
    },
}

pub fn article_document_id(article_id: &str) -> String {
    format!("article-{}", article_id)
}

pub fn user_document_id(profile_id: &str) -> String {
    format!("user-{}", profile_id)
}

pub struct ReverseSync {
    cms: Arc<dyn ContentStore>,
    store: Arc<dyn RelationalStore>,
}

impl ReverseSync {
    pub fn new(cms: Arc<dyn ContentStore>, store: Arc<dyn RelationalStore>) -> Self {
        Self { cms, store }
    }

    /// Publishes the article to the CMS and records the back-reference.
    /// Returns the CMS document id.
    pub async fn publish_article(&self, article_id: &str) -> Result<String, ReverseSyncError> {
        let article = self
            .store
            .get_article(article_id)?
            .ok_or_else(|| ReverseSyncError::ArticleNotFound(article_id.to_string()))?;
        ensure_not_cms_owned(&article)?;

        let author_ref = match article.author_id.as_deref() {
            Some(profile_id) => self.ensure_author_document(profile_id).await?,
            None => None,
        };

        let document_id = article_document_id(&article.id);
        self.cms
            .create_or_replace(article_document(&document_id, &article, author_ref.as_deref()))
            .await
            .map_err(ReverseSyncError::ContentStore)?;
        info!("Published article {} as {}", article.id, document_id);

        self.apply_back_reference(&article.id, &document_id)?;
        Ok(document_id)
    }

    /// Re-applies only the back-reference of an article already published.
    pub async fn reconcile(&self, article_id: &str) -> Result<String, ReverseSyncError> {
        let article = self
            .store
            .get_article(article_id)?
            .ok_or_else(|| ReverseSyncError::ArticleNotFound(article_id.to_string()))?;
        ensure_not_cms_owned(&article)?;

        let document_id = article_document_id(article_id);
        let exists = self
            .cms
            .get_document(&document_id)
            .await
            .map_err(ReverseSyncError::ContentStore)?
            .is_some();
        if !exists {
            return Err(ReverseSyncError::DocumentMissing(document_id));
        }

        self.apply_back_reference(article_id, &document_id)?;
        Ok(document_id)
    }

    fn apply_back_reference(
        &self,
        article_id: &str,
        document_id: &str,
    ) -> Result<(), ReverseSyncError> {
        self.store
            .set_article_back_reference(article_id, document_id)
            .map_err(|source| {
                warn!(
                    "Back-reference of article {} to {} failed: {}",
                    article_id, document_id, source
                );
                ReverseSyncError::BackReference {
                    document_id: document_id.to_string(),
                    source,
                }
            })
    }

    /// Returns the CMS user id for the profile, creating the CMS user
    /// document and the author link when missing.
    async fn ensure_author_document(
        &self,
        profile_id: &str,
    ) -> Result<Option<String>, ReverseSyncError> {
        if let Some(cms_user_id) = self.store.cms_user_for_profile(profile_id)? {
            return Ok(Some(cms_user_id));
        }

        let profile = match self.store.get_profile(profile_id)? {
            Some(profile) => profile,
            None => return Ok(None),
        };

        let cms_user_id = user_document_id(&profile.id);
        let name = profile
            .full_name
            .clone()
            .unwrap_or_else(|| profile.email.clone());
        self.cms
            .create_or_replace(json!({
                "_id": cms_user_id,
                "_type": "user",
                "name": name,
                "email": profile.email,
            }))
            .await
            .map_err(ReverseSyncError::ContentStore)?;
        self.store.link_author(&profile.id, &cms_user_id)?;
        info!("Created CMS user {} for profile {}", cms_user_id, profile.id);

        Ok(Some(cms_user_id))
    }
}

/// Only articles without a correlation key, or already pointing at their own
/// `article-<id>` document, may be written to the CMS from here.
fn ensure_not_cms_owned(article: &Article) -> Result<(), ReverseSyncError> {
    match article.sanity_id.as_deref() {
        Some(sanity_id) if sanity_id != article_document_id(&article.id) => {
            Err(ReverseSyncError::AlreadyInCms {
                article_id: article.id.clone(),
                document_id: sanity_id.to_string(),
            })
        }
        _ => Ok(()),
    }
}

fn article_document(document_id: &str, article: &Article, author_ref: Option<&str>) -> Value {
    let mut doc = json!({
        "_id": document_id,
        "_type": "blog",
        "title": article.title,
        "slug": { "_type": "slug", "current": article.slug },
        "content": article.content,
        "excerpt": article.excerpt,
        "publishDate": article
            .published_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
        "status": "published",
    });
    if let (Some(author_ref), Some(object)) = (author_ref, doc.as_object_mut()) {
        object.insert(
            "author".to_string(),
            json!({ "_type": "reference", "_ref": author_ref, "_weak": true }),
        );
    }
    doc
}
