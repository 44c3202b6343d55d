//! Application state management
//!
//! Contains shared state accessible across all handlers. Collaborator
//! hosts sit behind trait objects so tests can swap in fakes.

use crate::config::Settings;
use crate::hosts::{
    ContentHost, EmailHost, HttpContentHost, HttpEmailHost, HttpScreenshotHost, HttpSignatureHost,
    ScreenshotHost, SignatureHost,
};
use crate::store::MetadataStore;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,

    /// Workflow metadata store
    pub store: MetadataStore,

    /// Git-hosting content proxy
    pub content: Arc<dyn ContentHost>,

    /// E-signature proxy
    pub esign: Arc<dyn SignatureHost>,

    /// Screenshot renderer
    pub screenshot: Arc<dyn ScreenshotHost>,

    /// Email notification proxy
    pub email: Arc<dyn EmailHost>,
}

impl AppState {
    /// Wire up the HTTP collaborator clients from settings.
    pub fn new(settings: Settings) -> Self {
        let hosts = &settings.hosts;
        let content = Arc::new(HttpContentHost::new(hosts.content_endpoint.clone()));
        let esign = Arc::new(HttpSignatureHost::new(hosts.esign_endpoint.clone()));
        let screenshot = Arc::new(HttpScreenshotHost::new(
            hosts.screenshot_endpoint.clone(),
            hosts.screenshot_api_key.clone(),
        ));
        let email = Arc::new(HttpEmailHost::new(hosts.email_endpoint.clone()));

        Self {
            settings,
            store: MetadataStore::in_memory(),
            content,
            esign,
            screenshot,
            email,
        }
    }

    /// Build state from explicit collaborators (tests use fakes here).
    pub fn with_collaborators(
        settings: Settings,
        store: MetadataStore,
        content: Arc<dyn ContentHost>,
        esign: Arc<dyn SignatureHost>,
        screenshot: Arc<dyn ScreenshotHost>,
        email: Arc<dyn EmailHost>,
    ) -> Self {
        Self {
            settings,
            store,
            content,
            esign,
            screenshot,
            email,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
