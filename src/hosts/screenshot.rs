//! Screenshot host client
//!
//! Renders a public review URL into a preview image. The renderer wants
//! its field names in PascalCase and string-typed dimensions.

use crate::hosts::{check_status, HostError};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ScreenshotRequest {
    url: String,
    extra_loading_wait: String,
    screenshot_width: String,
    screenshot_height: String,
}

impl ScreenshotRequest {
    fn new(url: String) -> Self {
        Self {
            url,
            extra_loading_wait: "0".to_string(),
            screenshot_width: "1920".to_string(),
            screenshot_height: "1080".to_string(),
        }
    }
}

#[async_trait]
pub trait ScreenshotHost: Send + Sync {
    /// Render the page at `url`; returns the raw image bytes.
    async fn render(&self, url: &str) -> Result<Vec<u8>, HostError>;
}

/// reqwest-backed client against the screenshot renderer.
pub struct HttpScreenshotHost {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpScreenshotHost {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ScreenshotHost for HttpScreenshotHost {
    async fn render(&self, url: &str) -> Result<Vec<u8>, HostError> {
        debug!(url, "rendering map preview");
        let response = self
            .client
            .post(&self.endpoint)
            .header("Apikey", &self.api_key)
            .json(&ScreenshotRequest::new(url.to_string()))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_render_returns_bytes_and_sends_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("Apikey", "secret")
            .with_status(200)
            .with_body(vec![0x89, 0x50, 0x4e, 0x47])
            .create_async()
            .await;

        let host = HttpScreenshotHost::new(server.url(), "secret");
        let bytes = host
            .render("https://www.mapflow.io/screenshot/my-map/merge-1")
            .await
            .unwrap();
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
        mock.assert_async().await;
    }
}
