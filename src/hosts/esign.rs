//! E-signature host client
//!
//! The e-signature proxy turns a review envelope (content snapshot, hash,
//! preview image, recipients) into a signing workflow and answers with an
//! opaque envelope identifier.

use crate::hosts::{check_status, HostError};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// One signer on the envelope, derived 1:1 from a stakeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeRecipient {
    pub name: String,
    pub email: String,
}

/// The full sign-off bundle dispatched to the e-signature host.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeRequest {
    pub sender_name: String,
    pub message_from_sender: String,
    pub map_feature_name: String,
    pub original_map_feature_link: String,
    pub merge_request_link: String,
    pub merge_requester_notes: String,
    pub stakeholder_review_start_date: String,
    /// SHA-256 hex of the raw payload, for tamper evidence
    pub hash_of_merge_request_data: String,
    pub raw_merge_request_data: String,
    /// Base64-encoded preview image
    pub map_preview_image: String,
    pub recipients: Vec<EnvelopeRecipient>,
}

#[async_trait]
pub trait SignatureHost: Send + Sync {
    /// Dispatch the envelope; returns the host's envelope identifier.
    async fn submit_envelope(&self, request: &EnvelopeRequest) -> Result<String, HostError>;
}

/// reqwest-backed client against the e-signature proxy.
pub struct HttpSignatureHost {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSignatureHost {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SignatureHost for HttpSignatureHost {
    async fn submit_envelope(&self, request: &EnvelopeRequest) -> Result<String, HostError> {
        debug!(
            feature = %request.map_feature_name,
            recipients = request.recipients.len(),
            "submitting review envelope"
        );
        let response = self
            .client
            .post(format!("{}/api/GenerateEnvelope", self.endpoint))
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;
        // The proxy answers with the bare envelope id, sometimes quoted.
        let envelope_id = response.text().await?.trim().trim_matches('"').to_string();
        if envelope_id.is_empty() {
            return Err(HostError::Malformed(
                "e-signature host returned an empty envelope id".to_string(),
            ));
        }
        Ok(envelope_id)
    }
}
