//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod features;
mod merges;
mod revisions;
mod reviews;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Feature routes
        .route(
            "/api/features",
            post(features::create_feature).get(features::list_features),
        )
        .route(
            "/api/features/{name}",
            get(features::get_feature).put(features::update_feature_properties),
        )
        .route("/api/features/owner/{guid}", get(features::features_by_owner))
        .route(
            "/api/features/{name}/contributors",
            put(features::update_contributors),
        )
        .route(
            "/api/features/{name}/stakeholders",
            put(features::update_stakeholders),
        )
        .route("/api/geojson/{name}", get(features::get_raw_payload))
        // Revision routes
        .route("/api/revisions", post(revisions::create_revision))
        .route("/api/revisions/{feature}", get(revisions::list_revisions))
        .route(
            "/api/revisions/{feature}/{revision}",
            get(revisions::get_revision),
        )
        .route(
            "/api/revisions/{feature}/{revision}/content",
            put(revisions::update_revision_content),
        )
        .route(
            "/api/revisions/{feature}/{revision}/contributors",
            put(revisions::update_revision_contributors),
        )
        // Merge request routes
        .route("/api/mergerequest", post(merges::create_merge_request))
        .route("/api/mergerequest/{id}", get(merges::get_merge_request))
        .route(
            "/api/mergerequest/feature/{feature}",
            get(merges::list_merge_requests),
        )
        .route(
            "/api/mergerequest/{id}/content",
            put(merges::update_merge_content),
        )
        .route("/api/mergerequest/{id}/approve", post(merges::approve_merge_request))
        .route("/api/mergerequest/{id}/deny", post(merges::deny_merge_request))
        // Stakeholder review
        .route("/api/stakeholderreview", post(reviews::initiate_stakeholder_review))
        // Apply middleware and state
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    }
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
