//! Merge Request Routes
//!
//! API endpoints for the merge request lifecycle. The transitions
//! themselves live in [`crate::merge::MergeService`]; these handlers do
//! validation and response shaping.

use crate::error::{validation_error, AppError};
use crate::merge::MergeService;
use crate::models::{MergeRequest, SuccessResponse};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMergeRequestRequest {
    #[validate(length(min = 1, message = "A feature name is required"))]
    pub feature_name: String,
    #[validate(length(min = 1, message = "A revision name is required"))]
    pub revision_name: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMergeContentRequest {
    #[serde(default = "default_update_message")]
    pub message: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

fn default_update_message() -> String {
    "Update merge request content".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequestResponse {
    pub merge_request: MergeRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequestListResponse {
    pub merge_requests: Vec<MergeRequest>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Propose merging a revision into its feature
pub async fn create_merge_request(
    State(state): State<SharedState>,
    Json(req): Json<CreateMergeRequestRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<MergeRequestResponse>>), AppError> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let merge_request =
        MergeService::create(&state, &req.feature_name, &req.revision_name, req.notes).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Merge request created",
            MergeRequestResponse { merge_request },
        )),
    ))
}

/// Get a merge request by id
pub async fn get_merge_request(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse<MergeRequestResponse>>, AppError> {
    let merge_request = state.store.get_merge(&id).await?;
    Ok(Json(SuccessResponse::with_data(
        "Merge request retrieved",
        MergeRequestResponse { merge_request },
    )))
}

/// List a feature's merge requests
pub async fn list_merge_requests(
    State(state): State<SharedState>,
    Path(feature): Path<String>,
) -> Result<Json<SuccessResponse<MergeRequestListResponse>>, AppError> {
    let merge_requests = state
        .store
        .merges_for_feature(&crate::identity::feature_id(&feature))
        .await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} merge requests", merge_requests.len()),
        MergeRequestListResponse { merge_requests },
    )))
}

/// Push new content to the merge branch (rejected while under review)
pub async fn update_merge_content(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMergeContentRequest>,
) -> Result<Json<SuccessResponse<MergeRequestResponse>>, AppError> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let merge_request = MergeService::update_content(&state, &id, &req.message, &req.content).await?;
    Ok(Json(SuccessResponse::with_data(
        "Merge request content updated",
        MergeRequestResponse { merge_request },
    )))
}

/// Approve a merge request, folding its snapshot into the feature
pub async fn approve_merge_request(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse<MergeRequestResponse>>, AppError> {
    let merge_request = MergeService::approve(&state, &id).await?;
    Ok(Json(SuccessResponse::with_data(
        "Merge request approved",
        MergeRequestResponse { merge_request },
    )))
}

/// Deny a merge request
pub async fn deny_merge_request(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse<MergeRequestResponse>>, AppError> {
    let merge_request = MergeService::deny(&state, &id).await?;
    Ok(Json(SuccessResponse::with_data(
        "Merge request denied",
        MergeRequestResponse { merge_request },
    )))
}
