//! Revision Routes
//!
//! API endpoints for revisions: isolated lines of change branched off a
//! feature's main content line.

use crate::error::{conflict_error, not_found_error, validation_error, AppError};
use crate::identity;
use crate::models::{Revision, SuccessResponse, User};
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
pub struct CreateRevisionRequest {
    #[validate(length(min = 1, message = "A feature name is required"))]
    pub feature_name: String,
    #[validate(length(min = 1, max = 100, message = "A revision name is required"))]
    pub revision_name: String,
    #[serde(default)]
    pub description: String,
    pub owner: User,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    #[serde(default = "default_update_message")]
    pub message: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

fn default_update_message() -> String {
    "Update map data".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionResponse {
    pub revision: Revision,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionListResponse {
    pub revisions: Vec<Revision>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Create a revision by branching off the feature's main line
pub async fn create_revision(
    State(state): State<SharedState>,
    Json(req): Json<CreateRevisionRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<RevisionResponse>>), AppError> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let feature_id = identity::feature_id(&req.feature_name);
    let revision_slug = identity::normalize(&req.revision_name);
    let revision_id = identity::revision_id(&req.feature_name, &req.revision_name);

    if !state.store.feature_exists(&feature_id).await {
        return Err(not_found_error("No feature found with that name"));
    }
    if state.store.revision_exists(&revision_id).await {
        return Err(conflict_error("A revision with that name already exists"));
    }

    let commit = state
        .content
        .create_branch(&feature_id, identity::MAIN_BRANCH, &revision_slug)
        .await?;

    let raw_url = identity::raw_content_url(
        &state.settings.hosts.raw_content_base,
        &feature_id,
        &commit.sha,
    );
    let revision = Revision::new(
        revision_id,
        feature_id,
        revision_slug,
        raw_url,
        req.description,
        req.owner,
    );
    state.store.create_revision(&revision).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Revision created", RevisionResponse { revision })),
    ))
}

/// Get a revision by feature and revision name
pub async fn get_revision(
    State(state): State<SharedState>,
    Path((feature, revision)): Path<(String, String)>,
) -> Result<Json<SuccessResponse<RevisionResponse>>, AppError> {
    let revision = state
        .store
        .get_revision(&identity::revision_id(&feature, &revision))
        .await?;
    Ok(Json(SuccessResponse::with_data("Revision retrieved", RevisionResponse { revision })))
}

/// List a feature's revisions
pub async fn list_revisions(
    State(state): State<SharedState>,
    Path(feature): Path<String>,
) -> Result<Json<SuccessResponse<RevisionListResponse>>, AppError> {
    let revisions = state
        .store
        .revisions_for_feature(&identity::feature_id(&feature))
        .await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} revisions", revisions.len()),
        RevisionListResponse { revisions },
    )))
}

/// Push new content to a revision's branch
pub async fn update_revision_content(
    State(state): State<SharedState>,
    Path((feature, revision)): Path<(String, String)>,
    Json(req): Json<UpdateContentRequest>,
) -> Result<Json<SuccessResponse<RevisionResponse>>, AppError> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let mut revision = state
        .store
        .get_revision(&identity::revision_id(&feature, &revision))
        .await?;

    let commit = state
        .content
        .put_file(
            &revision.feature_name,
            &revision.revision_name,
            &req.message,
            &req.content,
        )
        .await?;
    // Re-address the payload at the new commit so cached reads cannot serve
    // the previous snapshot.
    revision.raw_url = identity::raw_content_url(
        &state.settings.hosts.raw_content_base,
        &revision.feature_name,
        &commit.sha,
    );
    let revision = state.store.replace_revision(&revision).await?;

    Ok(Json(SuccessResponse::with_data("Revision content updated", RevisionResponse { revision })))
}

/// Replace a revision's contributor list
pub async fn update_revision_contributors(
    State(state): State<SharedState>,
    Path((feature, revision)): Path<(String, String)>,
    Json(contributors): Json<Vec<User>>,
) -> Result<Json<SuccessResponse<RevisionResponse>>, AppError> {
    if contributors.iter().any(|c| c.guid.is_none()) {
        return Err(AppError::Validation(
            "All contributors must have a guid".to_string(),
        ));
    }

    let mut revision = state
        .store
        .get_revision(&identity::revision_id(&feature, &revision))
        .await?;
    revision.contributors = contributors;
    let revision = state.store.replace_revision(&revision).await?;

    Ok(Json(SuccessResponse::with_data("Contributors updated", RevisionResponse { revision })))
}
