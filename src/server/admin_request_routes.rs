//! Role requests: users ask for elevated roles, admins approve or reject.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use super::error::{ApiError, ApiResult};
use super::event_routes::MessageResponse;
use super::state::ServerState;
use crate::community::{review_role_request, submit_role_request, ReviewRequest, RoleRequestSubmission};
use crate::relational_store::RoleRequestStatus;

const REQUEST_ID_FIELD: &str = "requestId";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub request_id: String,
}

async fn submit(
    State(state): State<ServerState>,
    payload: Result<Json<RoleRequestSubmission>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let Json(submission) = payload?;
    let request = submit_role_request(&*state.stores.anonymous(), &submission)
        .map_err(|err| ApiError::community(err, REQUEST_ID_FIELD))?;
    Ok(Json(SubmitResponse {
        success: true,
        request_id: request.id,
    }))
}

async fn review(
    State(state): State<ServerState>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(review) = payload?;
    let decision = review_role_request(&*state.stores.service(), &review)
        .map_err(|err| ApiError::community(err, REQUEST_ID_FIELD))?;
    let message = match decision {
        RoleRequestStatus::Approved => "Request approved",
        _ => "Request rejected",
    };
    Ok(Json(MessageResponse {
        success: true,
        message: message.to_string(),
    }))
}

pub fn admin_request_routes() -> Router<ServerState> {
    Router::new()
        .route("/admin-requests", post(submit))
        .route("/admin-requests/review", post(review))
}
