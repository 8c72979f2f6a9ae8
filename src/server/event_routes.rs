use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::metrics;
use super::state::ServerState;
use crate::community::{CommunityError, EventRegistrations, RegistrationRequest};

const REGISTRATION_ID_FIELD: &str = "registrationId";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub success: bool,
    pub registration_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelRegistrationBody {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

fn registrations(state: &ServerState) -> EventRegistrations {
    EventRegistrations::new(
        state.stores.anonymous(),
        state.notifier.clone(),
        state.config.reminder_offsets_hours.clone(),
    )
}

fn registration_outcome(err: &CommunityError) -> &'static str {
    match err {
        CommunityError::Validation(_) => "rejected",
        CommunityError::Conflict { .. } => "duplicate",
        CommunityError::NotFound(_) => "unknown_event",
        CommunityError::Forbidden(_) | CommunityError::Store(_) => "error",
    }
}

async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> ApiResult<Json<RegistrationResponse>> {
    let Json(request) = payload?;
    match registrations(&state).register(&request).await {
        Ok(registration) => {
            metrics::record_registration("confirmed");
            Ok(Json(RegistrationResponse {
                success: true,
                registration_id: registration.id,
            }))
        }
        Err(err) => {
            metrics::record_registration(registration_outcome(&err));
            Err(ApiError::community(err, REGISTRATION_ID_FIELD))
        }
    }
}

async fn cancel_registration(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<CancelRegistrationBody>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(body) = payload?;
    let email = body
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Missing required fields".to_string()))?;

    registrations(&state)
        .cancel(&id, &email)
        .map_err(|err| ApiError::community(err, REGISTRATION_ID_FIELD))?;
    metrics::record_registration("cancelled");

    Ok(Json(MessageResponse {
        success: true,
        message: "Registration cancelled".to_string(),
    }))
}

pub fn event_routes() -> Router<ServerState> {
    Router::new()
        .route("/events/register", post(register))
        .route("/events/registrations/{id}/cancel", post(cancel_registration))
}
