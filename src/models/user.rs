//! User identity stub
//!
//! Users are owned by whichever entity embeds them and are immutable once
//! referenced; there is no standalone user collection.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Globally unique identifier. Contributor lists require it; other
    /// embeddings tolerate its absence.
    pub guid: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl User {
    /// Full display name, as it appears on review envelopes.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_joins_first_and_last() {
        let user = User {
            guid: Some("u-1".to_string()),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        };
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
