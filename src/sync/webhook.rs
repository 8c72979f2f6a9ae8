use super::{Operation, SyncError, SyncOutcome, SyncTarget, WebhookPayload};
use crate::cms::is_draft_id;
use crate::relational_store::RelationalStore;
use chrono::Utc;
use tracing::debug;

/// Applies one CMS webhook delivery. The signature must already have been
/// verified against the raw `body`.
pub fn handle_webhook(
    target: &dyn SyncTarget,
    store: &dyn RelationalStore,
    body: &[u8],
) -> Result<SyncOutcome, SyncError> {
    let payload = WebhookPayload::parse(body)?;

    if is_draft_id(&payload.document_id) {
        debug!("Ignoring draft {}", payload.document_id);
        return Ok(SyncOutcome::ignored("Draft documents are not synchronized"));
    }

    if let Some(doc_type) = payload.document_type() {
        if doc_type != target.doc_type() {
            debug!(
                "Ignoring {} document {} on {} webhook",
                doc_type,
                payload.document_id,
                target.doc_type()
            );
            return Ok(SyncOutcome::ignored(format!(
                "Document type {} is not handled here",
                doc_type
            )));
        }
    }

    match payload.operation {
        Operation::Create | Operation::Update => {
            target.upsert(store, &payload.document_id, &payload.document, Utc::now())
        }
        Operation::Delete => target.mark_deleted(store, &payload.document_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational_store::SqliteRelationalStore;
    use crate::sync::{ArticleSync, EventSync, SyncAction};
    use serde_json::json;
    use tempfile::TempDir;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn replaying_a_delivery_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SqliteRelationalStore::new(dir.path().join("c.db")).unwrap();
        let target = ArticleSync::new(None);
        let delivery = body(json!({
            "operation": "create",
            "result": {
                "_id": "b1",
                "_type": "blog",
                "_updatedAt": "2024-01-02T00:00:00Z",
                "title": "Hello",
                "slug": {"current": "hello"},
                "content": "Text"
            }
        }));

        let first = handle_webhook(&target, &store, &delivery).unwrap();
        let before = store.find_article_by_correlation("b1").unwrap().unwrap();
        let second = handle_webhook(&target, &store, &delivery).unwrap();
        let after = store.find_article_by_correlation("b1").unwrap().unwrap();

        assert_eq!(first.action, SyncAction::Created);
        assert_eq!(second.action, SyncAction::Updated);
        assert_eq!(before, after);
    }

    #[test]
    fn drafts_and_foreign_types_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = SqliteRelationalStore::new(dir.path().join("c.db")).unwrap();

        let draft = body(json!({
            "operation": "update",
            "result": {"_id": "drafts.b1", "_type": "blog", "title": "T", "slug": "t"}
        }));
        let outcome = handle_webhook(&ArticleSync::new(None), &store, &draft).unwrap();
        assert_eq!(outcome.action, SyncAction::Ignored);

        let blog_on_event_hook = body(json!({
            "operation": "create",
            "result": {"_id": "b1", "_type": "blog", "title": "T", "slug": "t"}
        }));
        let outcome = handle_webhook(&EventSync, &store, &blog_on_event_hook).unwrap();
        assert_eq!(outcome.action, SyncAction::Ignored);
        assert!(store.find_event_by_correlation("b1").unwrap().is_none());
    }
}
