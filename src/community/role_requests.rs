use super::{required, CommunityError};
use crate::relational_store::{
    ProfileRole, RelationalStore, RoleRequest, RoleRequestStatus, StoreError,
};
use serde::Deserialize;
use tracing::info;

const ALREADY_PROCESSED: &str = "Request has already been processed";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub request_id: Option<String>,
    pub admin_id: Option<String>,
    pub status: Option<String>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequestSubmission {
    pub user_id: Option<String>,
    pub requested_role: Option<String>,
    pub reason: Option<String>,
}

/// Records an admin's decision on a pending role request. Returns the
/// applied decision.
pub fn review_role_request(
    store: &dyn RelationalStore,
    review: &ReviewRequest,
) -> Result<RoleRequestStatus, CommunityError> {
    let (request_id, admin_id, status) = match (
        required(&review.request_id),
        required(&review.admin_id),
        required(&review.status),
    ) {
        (Some(request_id), Some(admin_id), Some(status)) => (request_id, admin_id, status),
        _ => {
            return Err(CommunityError::Validation(
                "Missing required fields".to_string(),
            ))
        }
    };
    let decision = match RoleRequestStatus::parse(status) {
        Some(decision @ (RoleRequestStatus::Approved | RoleRequestStatus::Rejected)) => decision,
        _ => {
            return Err(CommunityError::Validation(
                "Status must be approved or rejected".to_string(),
            ))
        }
    };

    let is_admin = store
        .get_profile(admin_id)?
        .map(|profile| profile.role.is_elevated())
        .unwrap_or(false);
    if !is_admin {
        return Err(CommunityError::Forbidden(
            "Only admins can review requests".to_string(),
        ));
    }

    let request = store
        .get_role_request(request_id)?
        .ok_or_else(|| CommunityError::NotFound("Request not found".to_string()))?;
    if request.status != RoleRequestStatus::Pending {
        return Err(CommunityError::Validation(ALREADY_PROCESSED.to_string()));
    }

    let feedback = required(&review.feedback);
    match store.review_role_request(&request.id, admin_id, decision, feedback) {
        Ok(reviewed) => {
            info!(
                "Role request {} for {} {} by {}",
                reviewed.id,
                reviewed.user_id,
                decision.as_str(),
                admin_id
            );
            Ok(decision)
        }
        // Another reviewer got there first.
        Err(StoreError::InvalidState(_)) => {
            Err(CommunityError::Validation(ALREADY_PROCESSED.to_string()))
        }
        Err(StoreError::NotFound(what)) => Err(CommunityError::NotFound(format!(
            "{} not found",
            what
        ))),
        Err(e) => Err(e.into()),
    }
}

pub fn submit_role_request(
    store: &dyn RelationalStore,
    submission: &RoleRequestSubmission,
) -> Result<RoleRequest, CommunityError> {
    let (user_id, requested_role) = match (
        required(&submission.user_id),
        required(&submission.requested_role),
    ) {
        (Some(user_id), Some(role)) => (user_id, role),
        _ => {
            return Err(CommunityError::Validation(
                "Missing required fields".to_string(),
            ))
        }
    };
    let requested_role = match ProfileRole::parse(requested_role) {
        Some(role @ (ProfileRole::Moderator | ProfileRole::Admin)) => role,
        _ => {
            return Err(CommunityError::Validation(
                "Requested role must be moderator or admin".to_string(),
            ))
        }
    };

    if store.get_profile(user_id)?.is_none() {
        return Err(CommunityError::NotFound("User not found".to_string()));
    }
    if let Some(pending) = store.pending_role_request_for(user_id)? {
        return Err(CommunityError::Conflict {
            message: "A request is already pending".to_string(),
            existing_id: Some(pending.id),
        });
    }

    let request =
        store.create_role_request(user_id, requested_role, required(&submission.reason))?;
    info!(
        "Role request {} submitted by {} for {}",
        request.id,
        user_id,
        requested_role.as_str()
    );
    Ok(request)
}
