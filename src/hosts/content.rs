//! Content host client
//!
//! The content host is a proxy in front of the Git hosting service. It
//! owns one repository per feature; branches are revisions and merge
//! branches; the payload is a single opaque file per branch. Every
//! mutating call answers with the resulting commit, which callers must use
//! to rebuild the content-addressed URL.

use crate::hosts::{check_status, HostError};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewRepoRequest {
    name: String,
    description: String,
    is_private: bool,
    /// Commit message for the initial payload
    message: String,
    /// Base64-encoded payload
    content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewBranchRequest {
    repo_name: String,
    branch_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PutFileRequest {
    repo_name: String,
    branch_name: String,
    message: String,
    /// Base64-encoded payload
    content: String,
}

/// Commit produced by a mutating content-host call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    /// Raw-download URL of the written file, when the host reports one
    pub download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitEnvelope {
    sha: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentEnvelope {
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    content: Option<ContentEnvelope>,
    commit: CommitEnvelope,
}

impl From<CommitResponse> for CommitInfo {
    fn from(response: CommitResponse) -> Self {
        CommitInfo {
            sha: response.commit.sha,
            download_url: response.content.and_then(|c| c.download_url),
        }
    }
}

/// Operations the workflow needs from the content host.
#[async_trait]
pub trait ContentHost: Send + Sync {
    /// Create a repository for a new feature, seeded with its payload.
    async fn create_repo(
        &self,
        name: &str,
        description: &str,
        message: &str,
        payload: &str,
    ) -> Result<CommitInfo, HostError>;

    /// Branch `new_branch` off `source` in `repo`; returns the tip commit.
    async fn create_branch(
        &self,
        repo: &str,
        source: &str,
        new_branch: &str,
    ) -> Result<CommitInfo, HostError>;

    /// Create or replace the payload file on a branch.
    async fn put_file(
        &self,
        repo: &str,
        branch: &str,
        message: &str,
        payload: &str,
    ) -> Result<CommitInfo, HostError>;

    /// Read a raw payload by its content-addressed URL.
    async fn fetch_raw(&self, url: &str) -> Result<String, HostError>;
}

/// reqwest-backed client against the Git-hosting proxy.
pub struct HttpContentHost {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpContentHost {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn parse_commit(response: reqwest::Response) -> Result<CommitInfo, HostError> {
        let response = check_status(response).await?;
        let parsed: CommitResponse = response
            .json()
            .await
            .map_err(|e| HostError::Malformed(e.to_string()))?;
        Ok(parsed.into())
    }
}

#[async_trait]
impl ContentHost for HttpContentHost {
    async fn create_repo(
        &self,
        name: &str,
        description: &str,
        message: &str,
        payload: &str,
    ) -> Result<CommitInfo, HostError> {
        debug!(repo = %name, "creating content-host repository");
        let body = NewRepoRequest {
            name: name.to_string(),
            description: description.to_string(),
            is_private: false,
            message: message.to_string(),
            content: base64::engine::general_purpose::STANDARD.encode(payload),
        };
        let response = self
            .client
            .post(format!("{}/api/CreateRepo", self.endpoint))
            .json(&body)
            .send()
            .await?;
        Self::parse_commit(response).await
    }

    async fn create_branch(
        &self,
        repo: &str,
        source: &str,
        new_branch: &str,
    ) -> Result<CommitInfo, HostError> {
        debug!(repo, source, new_branch, "creating content-host branch");
        let body = NewBranchRequest {
            repo_name: repo.to_string(),
            branch_name: new_branch.to_string(),
        };
        // The default source is the repo's main line; any other source is
        // addressed in the path.
        let url = if source == crate::identity::MAIN_BRANCH {
            format!("{}/api/branch", self.endpoint)
        } else {
            format!("{}/api/branch/{}", self.endpoint, source)
        };
        let response = self.client.post(url).json(&body).send().await?;
        Self::parse_commit(response).await
    }

    async fn put_file(
        &self,
        repo: &str,
        branch: &str,
        message: &str,
        payload: &str,
    ) -> Result<CommitInfo, HostError> {
        debug!(repo, branch, "pushing payload to content host");
        let body = PutFileRequest {
            repo_name: repo.to_string(),
            branch_name: branch.to_string(),
            message: message.to_string(),
            content: base64::engine::general_purpose::STANDARD.encode(payload),
        };
        let response = self
            .client
            .post(format!("{}/api/file", self.endpoint))
            .json(&body)
            .send()
            .await?;
        Self::parse_commit(response).await
    }

    async fn fetch_raw(&self, url: &str) -> Result<String, HostError> {
        let response = self.client.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMIT_BODY: &str = r#"{
        "content": { "downloadUrl": "https://raw.example.com/my-map/abc123/data.geojson" },
        "commit": { "sha": "abc123" }
    }"#;

    #[tokio::test]
    async fn test_create_branch_parses_commit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/branch/draft")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(COMMIT_BODY)
            .create_async()
            .await;

        let host = HttpContentHost::new(server.url());
        let commit = host.create_branch("my-map", "draft", "merge-1").await.unwrap();
        assert_eq!(commit.sha, "abc123");
        assert!(commit.download_url.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_branch_from_main_uses_bare_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/branch")
            .with_status(200)
            .with_body(COMMIT_BODY)
            .create_async()
            .await;

        let host = HttpContentHost::new(server.url());
        host.create_branch("my-map", "main", "draft").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_error_is_tagged_with_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/branch")
            .with_status(422)
            .with_body("Reference already exists")
            .create_async()
            .await;

        let host = HttpContentHost::new(server.url());
        let err = host.create_branch("my-map", "main", "draft").await.unwrap_err();
        match err {
            HostError::Upstream { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("Reference already exists"));
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_put_file_encodes_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/file")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "repoName": "my-map",
                "branchName": "draft",
                "content": base64::engine::general_purpose::STANDARD.encode("{\"type\":\"FeatureCollection\"}"),
            })))
            .with_status(200)
            .with_body(COMMIT_BODY)
            .create_async()
            .await;

        let host = HttpContentHost::new(server.url());
        host.put_file("my-map", "draft", "update", "{\"type\":\"FeatureCollection\"}")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_raw_returns_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/my-map/abc/data.geojson")
            .with_status(200)
            .with_body("{\"type\":\"FeatureCollection\",\"features\":[]}")
            .create_async()
            .await;

        let host = HttpContentHost::new(server.url());
        let body = host
            .fetch_raw(&format!("{}/my-map/abc/data.geojson", server.url()))
            .await
            .unwrap();
        assert!(body.contains("FeatureCollection"));
    }
}
