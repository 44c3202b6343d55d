//! External collaborator hosts
//!
//! The workflow core coordinates four independent external systems: the
//! Git-hosting content proxy, the e-signature proxy, the screenshot
//! renderer, and the email notification proxy. Each is reached through a
//! narrow trait so the workflow can be exercised against fakes, with one
//! reqwest-backed implementation per host.
//!
//! Every implementation returns a tagged [`HostError`] (success or an
//! upstream error with the status and message) rather than inferring
//! failure from ad hoc response fields.

pub mod content;
pub mod email;
pub mod esign;
pub mod screenshot;

pub use content::{CommitInfo, ContentHost, HttpContentHost};
pub use email::{EmailHost, HttpEmailHost};
pub use esign::{EnvelopeRecipient, EnvelopeRequest, HttpSignatureHost, SignatureHost};
pub use screenshot::{HttpScreenshotHost, ScreenshotHost};

use crate::error::AppError;
use thiserror::Error;

/// Tagged outcome of an outbound host call.
#[derive(Error, Debug)]
pub enum HostError {
    /// The host answered with a non-success status; its message is carried
    /// verbatim so callers can forward it.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The host could not be reached or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The host answered success but the payload was not in the agreed shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for HostError {
    fn from(err: reqwest::Error) -> Self {
        HostError::Transport(err.to_string())
    }
}

impl From<HostError> for AppError {
    fn from(err: HostError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

/// Turn a non-success response into `HostError::Upstream`, otherwise hand
/// the response back for payload extraction.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, HostError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    Err(HostError::Upstream {
        status: status.as_u16(),
        message,
    })
}
