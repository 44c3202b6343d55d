//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains the workflow entities and shared response envelopes.

pub mod feature;
pub mod merge;
pub mod revision;
pub mod user;

// Re-export commonly used types
pub use feature::*;
pub use merge::*;
pub use revision::*;
pub use user::*;

use serde::Serialize;

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}
