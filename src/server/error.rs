//! JSON error responses shared by every API route.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::error;

use crate::community::CommunityError;
use crate::relational_store::StoreError;
use crate::sync::{ReverseSyncError, SignatureError, SyncError};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    /// Rendered as a 400 carrying the id of the record that already exists
    /// under `id_field`.
    #[error("{message}")]
    Conflict {
        message: String,
        id_field: &'static str,
        existing_id: Option<String>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The CMS document exists but the relational row does not point at it
    /// yet.
    #[error("Failed to record back-reference to {document_id}: {detail}")]
    BackReference { document_id: String, detail: String },

    /// `detail` is logged, never returned to the client.
    #[error("{detail}")]
    Internal { detail: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::Internal {
            detail: detail.into(),
        }
    }

    /// Maps a community error, naming the id of a conflicting record
    /// `id_field` in the response body.
    pub fn community(err: CommunityError, id_field: &'static str) -> Self {
        match err {
            CommunityError::Validation(message) => ApiError::Validation(message),
            CommunityError::NotFound(message) => ApiError::NotFound(message),
            CommunityError::Forbidden(message) => ApiError::Forbidden(message),
            CommunityError::Conflict {
                message,
                existing_id,
            } => ApiError::Conflict {
                message,
                id_field,
                existing_id,
            },
            CommunityError::Store(e) => e.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BackReference { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(false));

        match self {
            ApiError::Conflict {
                message,
                id_field,
                existing_id,
            } => {
                body.insert("error".to_string(), Value::String(message));
                if let Some(existing_id) = existing_id {
                    body.insert(id_field.to_string(), Value::String(existing_id));
                }
            }
            ApiError::BackReference {
                document_id,
                detail,
            } => {
                error!(
                    "Back-reference to CMS document {} failed: {}",
                    document_id, detail
                );
                body.insert(
                    "error".to_string(),
                    json!(format!(
                        "CMS document {} was written but the article could not be updated",
                        document_id
                    )),
                );
                body.insert("documentId".to_string(), Value::String(document_id));
            }
            ApiError::Internal { detail } => {
                error!("Request failed: {}", detail);
                body.insert(
                    "error".to_string(),
                    Value::String(INTERNAL_ERROR_MESSAGE.to_string()),
                );
            }
            other => {
                body.insert("error".to_string(), Value::String(other.to_string()));
            }
        }

        (status, Json(Value::Object(body))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal(format!("Relational store: {}", err))
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::InvalidPayload(message) => ApiError::Validation(message),
            SyncError::Store(e) => e.into(),
            SyncError::ContentStore(e) => ApiError::internal(format!("Content store: {:#}", e)),
        }
    }
}

impl From<SignatureError> for ApiError {
    fn from(err: SignatureError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<ReverseSyncError> for ApiError {
    fn from(err: ReverseSyncError) -> Self {
        match err {
            e @ (ReverseSyncError::ArticleNotFound(_) | ReverseSyncError::DocumentMissing(_)) => {
                ApiError::NotFound(e.to_string())
            }
            ReverseSyncError::AlreadyInCms { document_id, .. } => ApiError::Conflict {
                message: "Article is managed in the CMS".to_string(),
                id_field: "documentId",
                existing_id: Some(document_id),
            },
            ReverseSyncError::ContentStore(e) => {
                ApiError::internal(format!("Content store: {:#}", e))
            }
            ReverseSyncError::Store(e) => e.into(),
            ReverseSyncError::BackReference {
                document_id,
                source,
            } => ApiError::BackReference {
                document_id,
                detail: source.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}
