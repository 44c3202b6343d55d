//! Feature Routes
//!
//! API endpoints for creating and maintaining map features. Creation is
//! content-host-first: the repository (and initial payload commit) must
//! exist before any metadata is persisted.

use crate::error::{conflict_error, validation_error, AppError};
use crate::identity;
use crate::models::{Feature, SuccessResponse, User};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeatureRequest {
    #[validate(length(min = 1, max = 100, message = "Feature name must be between 1 and 100 characters"))]
    #[validate(custom(function = "validate_map_name"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub owner: User,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Commit message for the initial payload
    #[serde(default = "default_create_message")]
    pub message: String,
    /// The initial map payload
    #[validate(length(min = 1, message = "Initial content is required"))]
    pub content: String,
}

fn default_create_message() -> String {
    "Initial map data".to_string()
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeaturePropertiesRequest {
    #[validate(length(max = 2000, message = "Description is limited to 2000 characters"))]
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureResponse {
    pub feature: Feature,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureListResponse {
    pub features: Vec<Feature>,
}

/// Validate a user-facing map name: letters, digits, spaces, hyphens,
/// underscores. Normalization handles casing and spaces afterwards.
fn validate_map_name(name: &str) -> Result<(), validator::ValidationError> {
    let re = regex::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _-]*$").unwrap();

    if !re.is_match(name) {
        let mut err = validator::ValidationError::new("invalid_name");
        err.message = Some(
            "Invalid name. Must start with a letter or digit and contain only letters, digits, spaces, hyphens, and underscores.".into(),
        );
        return Err(err);
    }

    Ok(())
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Create a new feature with its content-host repository
pub async fn create_feature(
    State(state): State<SharedState>,
    Json(req): Json<CreateFeatureRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<FeatureResponse>>), AppError> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let feature_id = identity::feature_id(&req.name);
    if state.store.feature_exists(&feature_id).await {
        return Err(conflict_error("A feature with that name already exists"));
    }

    // Repository first; a failure here leaves nothing behind.
    let commit = state
        .content
        .create_repo(&feature_id, &req.description, &req.message, &req.content)
        .await?;
    tracing::debug!(
        feature = %feature_id,
        sha = %commit.sha,
        download_url = ?commit.download_url,
        "content repository created"
    );

    let raw_url = identity::raw_content_url(
        &state.settings.hosts.raw_content_base,
        &feature_id,
        &commit.sha,
    );
    let feature = Feature::new(
        feature_id.clone(),
        req.name,
        raw_url,
        req.description,
        req.owner,
        req.tags,
    );
    state.store.create_feature(&feature).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Feature created", FeatureResponse { feature })),
    ))
}

/// Get a feature by name
pub async fn get_feature(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<SuccessResponse<FeatureResponse>>, AppError> {
    let feature = state.store.get_feature(&identity::feature_id(&name)).await?;
    Ok(Json(SuccessResponse::with_data("Feature retrieved", FeatureResponse { feature })))
}

/// List all features
pub async fn list_features(
    State(state): State<SharedState>,
) -> Result<Json<SuccessResponse<FeatureListResponse>>, AppError> {
    let features = state.store.list_features().await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} features", features.len()),
        FeatureListResponse { features },
    )))
}

/// List features owned by a user
pub async fn features_by_owner(
    State(state): State<SharedState>,
    Path(guid): Path<String>,
) -> Result<Json<SuccessResponse<FeatureListResponse>>, AppError> {
    let features = state.store.features_by_owner(&guid).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} features", features.len()),
        FeatureListResponse { features },
    )))
}

/// Update a feature's free-text properties
pub async fn update_feature_properties(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(req): Json<UpdateFeaturePropertiesRequest>,
) -> Result<Json<SuccessResponse<FeatureResponse>>, AppError> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let mut feature = state.store.get_feature(&identity::feature_id(&name)).await?;
    feature.update_properties(req.description, req.tags);
    let feature = state.store.replace_feature(&feature).await?;

    Ok(Json(SuccessResponse::with_data("Feature updated", FeatureResponse { feature })))
}

/// Replace a feature's contributor list
pub async fn update_contributors(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(contributors): Json<Vec<User>>,
) -> Result<Json<SuccessResponse<FeatureResponse>>, AppError> {
    if contributors.iter().any(|c| c.guid.is_none()) {
        return Err(AppError::Validation(
            "All contributors must have a guid".to_string(),
        ));
    }

    let mut feature = state.store.get_feature(&identity::feature_id(&name)).await?;
    feature.contributors = contributors;
    let feature = state.store.replace_feature(&feature).await?;

    Ok(Json(SuccessResponse::with_data("Contributors updated", FeatureResponse { feature })))
}

/// Replace a feature's stakeholder list
pub async fn update_stakeholders(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(stakeholders): Json<Vec<User>>,
) -> Result<Json<SuccessResponse<FeatureResponse>>, AppError> {
    let mut feature = state.store.get_feature(&identity::feature_id(&name)).await?;
    feature.stakeholders = stakeholders;
    let feature = state.store.replace_feature(&feature).await?;

    Ok(Json(SuccessResponse::with_data("Stakeholders updated", FeatureResponse { feature })))
}

/// Stream a feature's raw payload from its content-addressed URL
pub async fn get_raw_payload(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let feature = state.store.get_feature(&identity::feature_id(&name)).await?;
    let payload = state.content.fetch_raw(&feature.raw_url).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], payload))
}
