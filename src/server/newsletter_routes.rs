use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::event_routes::MessageResponse;
use super::metrics;
use super::state::ServerState;
use crate::community::{subscribe, unsubscribe, SubscribeOutcome, UnsubscribeOutcome};

#[derive(Debug, Deserialize)]
pub struct NewsletterBody {
    pub email: Option<String>,
}

fn message(message: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message: message.to_string(),
    })
}

async fn subscribe_email(
    State(state): State<ServerState>,
    payload: Result<Json<NewsletterBody>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(body) = payload?;
    let email = body.email.unwrap_or_default();
    let outcome = subscribe(&*state.stores.anonymous(), &email)
        .map_err(|err| ApiError::community(err, "subscriberId"))?;
    metrics::record_subscription(match outcome {
        SubscribeOutcome::Subscribed => "subscribed",
        SubscribeOutcome::Resubscribed => "resubscribed",
    });
    Ok(message(outcome.message()))
}

async fn unsubscribe_email(
    State(state): State<ServerState>,
    payload: Result<Json<NewsletterBody>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(body) = payload?;
    let email = body.email.unwrap_or_default();
    let outcome = unsubscribe(&*state.stores.anonymous(), &email)
        .map_err(|err| ApiError::community(err, "subscriberId"))?;
    if outcome == UnsubscribeOutcome::Unsubscribed {
        metrics::record_subscription("unsubscribed");
    }
    Ok(message(outcome.message()))
}

pub fn newsletter_routes() -> Router<ServerState> {
    Router::new()
        .route("/newsletter/subscribe", post(subscribe_email))
        .route("/newsletter/unsubscribe", post(unsubscribe_email))
}
