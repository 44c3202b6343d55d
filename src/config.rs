//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum ConfigError {
    #[error("Failed to load environment variables: {0}")]
    EnvLoad(#[from] dotenvy::Error),

    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for container deploys
            port: 3000,
        }
    }
}

/// Endpoints of the external collaborator hosts.
///
/// The content host is a proxy in front of the Git hosting service; the
/// e-signature, screenshot, and email hosts are likewise thin HTTP proxies.
#[derive(Debug, Clone, Deserialize)]
pub struct HostsConfig {
    /// Git-hosting proxy base URL (repo/branch/file operations)
    pub content_endpoint: String,
    /// Base URL for content-addressed raw payload downloads
    pub raw_content_base: String,
    /// E-signature proxy base URL
    pub esign_endpoint: String,
    /// Screenshot rendering service URL
    pub screenshot_endpoint: String,
    /// API key for the screenshot service
    pub screenshot_api_key: String,
    /// Email notification proxy URL
    pub email_endpoint: String,
    /// Public site base URL, used to build review-facing links
    pub site_base: String,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            content_endpoint: "http://localhost:7071".to_string(),
            raw_content_base: "https://raw.mapflow.io".to_string(),
            esign_endpoint: "http://localhost:7072".to_string(),
            screenshot_endpoint: "https://api.cloudmersive.com/convert/web/url/to/screenshot"
                .to_string(),
            screenshot_api_key: String::new(),
            email_endpoint: "http://localhost:7073".to_string(),
            site_base: "https://www.mapflow.io".to_string(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub hosts: HostsConfig,
    pub cors: CorsConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: std::env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let defaults = HostsConfig::default();
        let hosts = HostsConfig {
            content_endpoint: env_url("CONTENT_HOST_ENDPOINT", defaults.content_endpoint)?,
            raw_content_base: env_url("RAW_CONTENT_BASE", defaults.raw_content_base)?,
            esign_endpoint: env_url("ESIGN_ENDPOINT", defaults.esign_endpoint)?,
            screenshot_endpoint: env_url("SCREENSHOT_ENDPOINT", defaults.screenshot_endpoint)?,
            screenshot_api_key: std::env::var("SCREENSHOT_API_KEY").unwrap_or_default(),
            email_endpoint: env_url("EMAIL_ENDPOINT", defaults.email_endpoint)?,
            site_base: env_url("SITE_BASE_URL", defaults.site_base)?,
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        Ok(Self {
            server,
            hosts,
            cors,
        })
    }
}

/// Read a URL-valued variable, validating it parses; trailing slashes are
/// trimmed so endpoint joining stays predictable.
fn env_url(var: &str, default: String) -> Result<String, ConfigError> {
    let raw = std::env::var(var).unwrap_or(default);
    let trimmed = raw.trim_end_matches('/').to_string();
    url::Url::parse(&trimmed)
        .map_err(|_| ConfigError::InvalidValue(format!("{} is not a valid URL: {}", var, raw)))?;
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_env_url_rejects_garbage() {
        let result = env_url("SOME_UNSET_MAPFLOW_VAR", "not a url".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_env_url_trims_trailing_slash() {
        let url = env_url(
            "SOME_UNSET_MAPFLOW_VAR",
            "https://example.com/api/".to_string(),
        )
        .unwrap();
        assert_eq!(url, "https://example.com/api");
    }
}
