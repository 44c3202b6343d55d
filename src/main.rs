//! MapFlow API - Map Governance Platform
//!
//! Git-style merge requests for geospatial map datasets: propose changes
//! as revisions, fold them back through merge requests, and gate merges
//! behind stakeholder e-signature reviews.
//!
//! The payloads live in a Git-hosting content proxy (one repository per
//! feature, one branch per revision or merge); workflow metadata lives in
//! a document store. Approval copies the merge branch's snapshot onto the
//! feature's main line.

mod config;
mod error;
mod hosts;
mod identity;
mod merge;
mod models;
mod review;
mod routes;
mod state;
mod store;

use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting MapFlow - Map Governance Platform...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");
    info!("🔗 Content host: {}", settings.hosts.content_endpoint);
    info!("🔗 E-signature host: {}", settings.hosts.esign_endpoint);

    // Wire up collaborator clients and the metadata store
    let state = Arc::new(AppState::new(settings.clone()));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Features ───");
    info!("   POST /api/features                        - Create feature (with content repo)");
    info!("   GET  /api/features                        - List all features");
    info!("   GET  /api/features/{{name}}                 - Get feature by name");
    info!("   GET  /api/features/owner/{{guid}}           - List features by owner");
    info!("   PUT  /api/features/{{name}}                 - Update feature properties");
    info!("   PUT  /api/features/{{name}}/contributors    - Replace contributors");
    info!("   PUT  /api/features/{{name}}/stakeholders    - Replace stakeholders");
    info!("   GET  /api/geojson/{{name}}                  - Fetch raw map payload");
    info!("");
    info!("   ─── Revisions ───");
    info!("   POST /api/revisions                       - Branch a revision off a feature");
    info!("   PUT  /api/revisions/{{f}}/{{r}}/content       - Push revision content");
    info!("   PUT  /api/revisions/{{f}}/{{r}}/contributors  - Replace contributors");
    info!("");
    info!("   ─── Merge Requests ───");
    info!("   POST /api/mergerequest                    - Propose a merge");
    info!("   PUT  /api/mergerequest/{{id}}/content       - Push merge content");
    info!("   POST /api/mergerequest/{{id}}/approve       - Approve (fold into feature)");
    info!("   POST /api/mergerequest/{{id}}/deny          - Deny");
    info!("   POST /api/stakeholderreview               - Send stakeholder review envelope");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mapflow_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
