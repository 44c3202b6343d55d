//! Email notification host client
//!
//! Off the critical path: workflow outcomes notify participants as a
//! courtesy, and callers are expected to log-and-continue on failure.

use crate::hosts::{check_status, HostError};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct EmailRequest {
    recipient: String,
    subject: String,
    body: String,
}

#[async_trait]
pub trait EmailHost: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), HostError>;
}

/// reqwest-backed client against the email proxy.
pub struct HttpEmailHost {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEmailHost {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EmailHost for HttpEmailHost {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), HostError> {
        debug!(recipient, subject, "sending notification email");
        let request = EmailRequest {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_posts_pascal_case_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "Recipient": "rex@example.com",
                "Subject": "Merge request approved",
            })))
            .with_status(200)
            .create_async()
            .await;

        let host = HttpEmailHost::new(server.url());
        host.send("rex@example.com", "Merge request approved", "body")
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
