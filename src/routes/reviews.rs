//! Stakeholder Review Routes
//!
//! API endpoint that kicks off the e-signature sign-off workflow for a
//! merge request.

use crate::error::{validation_error, AppError};
use crate::models::{MergeRequest, SuccessResponse, User};
use crate::review::ReviewOrchestrator;
use crate::state::SharedState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderReviewRequest {
    #[validate(length(min = 1, message = "A merge request id is required"))]
    pub merge_id: String,
    #[validate(length(min = 1, message = "A sender name is required"))]
    pub sender_name: String,
    #[serde(default)]
    pub message_from_sender: String,
    #[validate(length(min = 1, message = "At least one stakeholder is required"))]
    pub stakeholders: Vec<User>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderReviewResponse {
    pub merge_request: MergeRequest,
}

/// Dispatch a review envelope and record it on the merge request
pub async fn initiate_stakeholder_review(
    State(state): State<SharedState>,
    Json(req): Json<StakeholderReviewRequest>,
) -> Result<Json<SuccessResponse<StakeholderReviewResponse>>, AppError> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let merge_request = ReviewOrchestrator::request_review(
        &state,
        &req.merge_id,
        &req.sender_name,
        &req.message_from_sender,
        req.stakeholders,
    )
    .await?;

    Ok(Json(SuccessResponse::with_data(
        "Stakeholder review sent",
        StakeholderReviewResponse { merge_request },
    )))
}
