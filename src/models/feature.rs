//! Feature entity
//!
//! A named, long-lived map dataset with an owner, stakeholders, and a
//! canonical content line hosted in its own content-host repository.
//! Features are created once and never deleted.

use crate::models::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Normalized slug, doubles as the document id
    pub id: String,
    pub name: String,
    /// Content-host repository name (same slug as the id)
    pub repo: String,
    /// Content-addressed URL of the canonical payload
    pub raw_url: String,
    #[serde(default)]
    pub description: String,
    pub owner: User,
    #[serde(default)]
    pub contributors: Vec<User>,
    #[serde(default)]
    pub stakeholders: Vec<User>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    /// Optimistic-concurrency token, incremented by the store on replace
    #[serde(default)]
    pub version: u64,
}

impl Feature {
    pub fn new(
        id: String,
        name: String,
        raw_url: String,
        description: String,
        owner: User,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            repo: id.clone(),
            id,
            name,
            raw_url,
            description,
            owner,
            contributors: Vec::new(),
            stakeholders: Vec::new(),
            tags,
            created_date: now,
            last_modified_date: now,
            version: 0,
        }
    }

    /// Record a new canonical payload snapshot. Returns false when the URL
    /// is unchanged, letting callers skip a redundant store write on retry.
    pub fn record_content(&mut self, raw_url: String) -> bool {
        if self.raw_url == raw_url {
            return false;
        }
        self.raw_url = raw_url;
        self.last_modified_date = Utc::now();
        true
    }

    /// Update the free-text properties
    pub fn update_properties(&mut self, description: Option<String>, tags: Option<Vec<String>>) {
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        self.last_modified_date = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_feature() -> Feature {
        Feature::new(
            "my-map".to_string(),
            "My Map".to_string(),
            "https://raw.mapflow.io/my-map/main/data.geojson".to_string(),
            "trails".to_string(),
            User {
                guid: Some("u-1".to_string()),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            },
            vec!["trails".to_string()],
        )
    }

    #[test]
    fn test_record_content_bumps_timestamp_on_change() {
        let mut feature = test_feature();
        let before = feature.last_modified_date;
        let changed =
            feature.record_content("https://raw.mapflow.io/my-map/abc123/data.geojson".to_string());
        assert!(changed);
        assert!(feature.last_modified_date >= before);
        assert!(feature.raw_url.contains("abc123"));
    }

    #[test]
    fn test_record_content_noops_on_same_url() {
        let mut feature = test_feature();
        let url = feature.raw_url.clone();
        assert!(!feature.record_content(url));
    }
}
