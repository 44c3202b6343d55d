//! Revision entity
//!
//! An isolated line of change against a feature, analogous to a branch.
//! The id is the feature slug and revision slug concatenated, so at most
//! one revision exists per (feature, name) pair.

use crate::models::User;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    pub feature_name: String,
    pub revision_name: String,
    /// Content-addressed URL of the revision's payload
    pub raw_url: String,
    #[serde(default)]
    pub description: String,
    pub owner: User,
    #[serde(default)]
    pub contributors: Vec<User>,
    /// Optimistic-concurrency token, incremented by the store on replace
    #[serde(default)]
    pub version: u64,
}

impl Revision {
    pub fn new(
        id: String,
        feature_name: String,
        revision_name: String,
        raw_url: String,
        description: String,
        owner: User,
    ) -> Self {
        Self {
            id,
            feature_name,
            revision_name,
            raw_url,
            description,
            owner,
            contributors: Vec::new(),
            version: 0,
        }
    }
}
