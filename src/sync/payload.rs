//! Webhook payload parsing and CMS document normalization.

use super::SyncError;
use crate::relational_store::{ArticleFields, EventFields};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

pub const EXCERPT_LENGTH: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Operation::Create),
            "update" => Some(Operation::Update),
            "delete" => Some(Operation::Delete),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct RawWebhookBody {
    operation: Option<String>,
    #[serde(default)]
    result: Value,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WebhookPayload {
    pub operation: Operation,
    pub document_id: String,
    pub document: Value,
}

impl WebhookPayload {
    pub fn parse(body: &[u8]) -> Result<Self, SyncError> {
        let raw: RawWebhookBody = serde_json::from_slice(body)
            .map_err(|e| SyncError::InvalidPayload(format!("Invalid JSON body: {}", e)))?;

        let operation = raw
            .operation
            .as_deref()
            .and_then(Operation::parse)
            .ok_or_else(|| SyncError::InvalidPayload("Missing or unknown operation".to_string()))?;

        let document_id = text(&raw.result, "_id")
            .map(str::to_string)
            .or(raw.document_id.filter(|id| !id.trim().is_empty()))
            .ok_or_else(|| SyncError::InvalidPayload("Missing document id".to_string()))?;

        Ok(Self {
            operation,
            document_id,
            document: raw.result,
        })
    }

    pub fn document_type(&self) -> Option<&str> {
        text(&self.document, "_type")
    }
}

/// Non-blank string field.
fn text<'a>(doc: &'a Value, key: &str) -> Option<&'a str> {
    doc.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn slug(doc: &Value) -> Option<String> {
    match doc.get("slug") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(obj) => text(obj, "current").map(str::to_string),
        None => None,
    }
}

/// Flattens structured text blocks to plain text: span texts are joined
/// within a block and blocks are separated by a blank line.
pub fn flatten_blocks(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter_map(|block| {
            let children = block.get("children")?.as_array()?;
            let line: String = children
                .iter()
                .filter_map(|span| span.get("text").and_then(Value::as_str))
                .collect();
            if line.trim().is_empty() {
                None
            } else {
                Some(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn body_text(doc: &Value) -> String {
    for key in ["content", "body", "description"] {
        match doc.get(key) {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Array(blocks)) => return flatten_blocks(blocks),
            _ => continue,
        }
    }
    String::new()
}

pub fn excerpt(doc: &Value, body: &str) -> Option<String> {
    if let Some(excerpt) = text(doc, "excerpt") {
        return Some(excerpt.to_string());
    }
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if body.chars().count() > EXCERPT_LENGTH {
        let truncated: String = body.chars().take(EXCERPT_LENGTH).collect();
        Some(format!("{}...", truncated))
    } else {
        Some(body.to_string())
    }
}

/// RFC 3339 in UTC. Date-only inputs become midnight UTC.
pub fn normalize_timestamp(value: &str) -> Option<String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).to_rfc3339());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().to_rfc3339())
}

fn first_timestamp(doc: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| text(doc, key))
        .find_map(normalize_timestamp)
}

fn updated_at(doc: &Value, now: DateTime<Utc>) -> String {
    first_timestamp(doc, &["_updatedAt"]).unwrap_or_else(|| now.to_rfc3339())
}

pub fn media(doc: &Value) -> Option<String> {
    ["mainImage", "coverImage", "image"].iter().find_map(|key| {
        let asset = doc.get(*key)?.get("asset")?;
        text(asset, "url")
            .or_else(|| text(asset, "_ref"))
            .map(str::to_string)
    })
}

pub fn reference(doc: &Value, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(|r| text(r, "_ref"))
        .map(str::to_string)
}

fn required_title_and_slug(doc: &Value) -> Result<(String, String), SyncError> {
    let title = text(doc, "title")
        .ok_or_else(|| SyncError::InvalidPayload("Document has no title".to_string()))?;
    let slug = slug(doc)
        .ok_or_else(|| SyncError::InvalidPayload("Document has no slug".to_string()))?;
    Ok((title.to_string(), slug))
}

/// Article fields plus the CMS references that still need resolving against
/// the relational store.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedArticle {
    pub fields: ArticleFields,
    pub author_ref: Option<String>,
    pub series_ref: Option<String>,
}

pub fn normalize_article(doc: &Value, now: DateTime<Utc>) -> Result<NormalizedArticle, SyncError> {
    let (title, slug) = required_title_and_slug(doc)?;
    let content = body_text(doc);
    let status = match text(doc, "status") {
        Some(status @ ("draft" | "published")) => status,
        _ => "published",
    };

    Ok(NormalizedArticle {
        fields: ArticleFields {
            title,
            slug,
            excerpt: excerpt(doc, &content),
            content,
            status: status.to_string(),
            cover_image: media(doc),
            series_id: None,
            published_at: first_timestamp(doc, &["publishDate", "publishedAt", "_createdAt"]),
            updated_at: updated_at(doc, now),
        },
        author_ref: reference(doc, "author"),
        series_ref: reference(doc, "series"),
    })
}

pub fn normalize_event(doc: &Value, now: DateTime<Utc>) -> Result<EventFields, SyncError> {
    let (title, slug) = required_title_and_slug(doc)?;

    let location = match doc.get("location") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(obj @ Value::Object(_)) => text(obj, "name").map(str::to_string),
        _ => None,
    };
    let capacity = doc
        .get("capacity")
        .and_then(Value::as_i64)
        .filter(|c| *c >= 0);

    Ok(EventFields {
        title,
        slug,
        description: body_text(doc),
        status: text(doc, "status").unwrap_or("published").to_string(),
        start_date: first_timestamp(doc, &["startDate", "date"]),
        end_date: first_timestamp(doc, &["endDate"]),
        location,
        capacity,
        cover_image: media(doc),
        updated_at: updated_at(doc, now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn parses_operation_and_id() {
        let payload = WebhookPayload::parse(
            br#"{"operation":"update","result":{"_id":"b1","_type":"blog"}}"#,
        )
        .unwrap();
        assert_eq!(payload.operation, Operation::Update);
        assert_eq!(payload.document_id, "b1");
        assert_eq!(payload.document_type(), Some("blog"));

        let payload =
            WebhookPayload::parse(br#"{"operation":"delete","documentId":"b2"}"#).unwrap();
        assert_eq!(payload.operation, Operation::Delete);
        assert_eq!(payload.document_id, "b2");
        assert_eq!(payload.document_type(), None);
    }

    #[test]
    fn rejects_bad_payloads() {
        assert!(matches!(
            WebhookPayload::parse(b"not json"),
            Err(SyncError::InvalidPayload(_))
        ));
        assert!(matches!(
            WebhookPayload::parse(br#"{"operation":"publish","documentId":"b1"}"#),
            Err(SyncError::InvalidPayload(_))
        ));
        assert!(matches!(
            WebhookPayload::parse(br#"{"operation":"create","result":{}}"#),
            Err(SyncError::InvalidPayload(_))
        ));
    }

    #[test]
    fn flattens_rich_text() {
        let blocks = json!([
            {"_type": "block", "children": [{"text": "Hello "}, {"text": "world"}]},
            {"_type": "image"},
            {"_type": "block", "children": [{"text": "Second"}]}
        ]);
        assert_eq!(
            flatten_blocks(blocks.as_array().unwrap()),
            "Hello world\n\nSecond"
        );
    }

    #[test]
    fn body_falls_back_through_fields() {
        assert_eq!(body_text(&json!({"content": "a", "body": "b"})), "a");
        assert_eq!(body_text(&json!({"body": "b", "description": "c"})), "b");
        assert_eq!(body_text(&json!({"description": "c"})), "c");
        assert_eq!(body_text(&json!({})), "");
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let body = "x".repeat(200);
        let generated = excerpt(&json!({}), &body).unwrap();
        assert_eq!(generated.chars().count(), EXCERPT_LENGTH + 3);
        assert!(generated.ends_with("..."));

        assert_eq!(excerpt(&json!({}), "short"), Some("short".to_string()));
        assert_eq!(
            excerpt(&json!({"excerpt": "given"}), &body),
            Some("given".to_string())
        );
        assert_eq!(excerpt(&json!({}), "  "), None);
    }

    #[test]
    fn timestamps_are_normalized() {
        assert_eq!(
            normalize_timestamp("2024-03-05"),
            Some("2024-03-05T00:00:00+00:00".to_string())
        );
        assert_eq!(
            normalize_timestamp("2024-03-05T10:00:00+02:00"),
            Some("2024-03-05T08:00:00+00:00".to_string())
        );
        assert_eq!(normalize_timestamp("yesterday"), None);
    }

    #[test]
    fn normalizes_article() {
        let doc = json!({
            "_id": "b1",
            "_type": "blog",
            "_createdAt": "2024-01-01T00:00:00Z",
            "_updatedAt": "2024-01-02T00:00:00Z",
            "title": "Hello",
            "slug": {"current": "hello"},
            "body": [{"children": [{"text": "Body text"}]}],
            "status": "archived",
            "author": {"_ref": "user-42"},
            "series": {"_ref": "s1"},
            "mainImage": {"asset": {"_ref": "image-abc"}}
        });

        let normalized = normalize_article(&doc, now()).unwrap();
        assert_eq!(normalized.fields.title, "Hello");
        assert_eq!(normalized.fields.slug, "hello");
        assert_eq!(normalized.fields.content, "Body text");
        assert_eq!(normalized.fields.excerpt.as_deref(), Some("Body text"));
        assert_eq!(normalized.fields.status, "published");
        assert_eq!(
            normalized.fields.published_at.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
        assert_eq!(normalized.fields.updated_at, "2024-01-02T00:00:00+00:00");
        assert_eq!(normalized.fields.cover_image.as_deref(), Some("image-abc"));
        assert_eq!(normalized.author_ref.as_deref(), Some("user-42"));
        assert_eq!(normalized.series_ref.as_deref(), Some("s1"));
    }

    #[test]
    fn article_without_updated_at_uses_now() {
        let doc = json!({"title": "T", "slug": "t", "status": "draft"});
        let normalized = normalize_article(&doc, now()).unwrap();
        assert_eq!(normalized.fields.status, "draft");
        assert_eq!(normalized.fields.updated_at, now().to_rfc3339());
    }

    #[test]
    fn article_requires_title_and_slug() {
        assert!(matches!(
            normalize_article(&json!({"slug": "t"}), now()),
            Err(SyncError::InvalidPayload(_))
        ));
        assert!(matches!(
            normalize_article(&json!({"title": "T"}), now()),
            Err(SyncError::InvalidPayload(_))
        ));
    }

    #[test]
    fn normalizes_event() {
        let doc = json!({
            "title": "Meetup",
            "slug": {"current": "meetup"},
            "description": "Talks",
            "date": "2030-05-01",
            "endDate": "2030-05-01T22:00:00Z",
            "location": {"name": "Town hall"},
            "capacity": 50,
            "coverImage": {"asset": {"url": "https://cdn/x.png"}}
        });

        let fields = normalize_event(&doc, now()).unwrap();
        assert_eq!(fields.status, "published");
        assert_eq!(fields.description, "Talks");
        assert_eq!(
            fields.start_date.as_deref(),
            Some("2030-05-01T00:00:00+00:00")
        );
        assert_eq!(fields.end_date.as_deref(), Some("2030-05-01T22:00:00+00:00"));
        assert_eq!(fields.location.as_deref(), Some("Town hall"));
        assert_eq!(fields.capacity, Some(50));
        assert_eq!(fields.cover_image.as_deref(), Some("https://cdn/x.png"));
    }

    #[test]
    fn negative_capacity_is_dropped() {
        let doc = json!({"title": "T", "slug": "t", "capacity": -1, "location": "Online"});
        let fields = normalize_event(&doc, now()).unwrap();
        assert_eq!(fields.capacity, None);
        assert_eq!(fields.location.as_deref(), Some("Online"));
    }
}
