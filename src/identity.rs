//! Content identity resolver
//!
//! Canonical identifiers for features, revisions, and merge requests, plus
//! the content-addressed URLs that pin a payload to an immutable snapshot.
//!
//! Feature and revision ids are deterministic functions of user-supplied
//! names; merge ids are random. Everything here is pure string construction
//! so repeated calls are stable and side-effect free.

use uuid::Uuid;

/// File name of the opaque map payload inside every content-host repository.
pub const PAYLOAD_FILE: &str = "data.geojson";

/// Branch name of a feature's canonical content line.
pub const MAIN_BRANCH: &str = "main";

/// Canonicalize a user-supplied name: lower-case, spaces become hyphens.
///
/// "My Map", "my map", and "my-map" all normalize to "my-map"; callers
/// relying on uniqueness must treat post-normalization collisions as the
/// same document.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

/// Deterministic feature id: the normalized slug itself.
pub fn feature_id(name: &str) -> String {
    normalize(name)
}

/// Deterministic revision id: feature slug and revision slug concatenated.
/// At most one revision may exist per (feature, name) pair.
pub fn revision_id(feature_name: &str, revision_name: &str) -> String {
    format!("{}{}", normalize(feature_name), normalize(revision_name))
}

/// Allocate a merge request id. Unlike feature/revision ids this is not
/// deterministic; collisions are negligible by construction.
pub fn new_merge_id() -> String {
    format!("merge-{}", Uuid::new_v4())
}

/// Content-addressed URL of a payload: `<base>/<repo>/<ref>/data.geojson`.
///
/// `git_ref` should be a commit sha whenever the content host returned one;
/// a commit-pinned URL is immutable and therefore cache-safe, while a
/// branch-pinned URL is only correct until the next push.
pub fn raw_content_url(base: &str, repo: &str, git_ref: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        base.trim_end_matches('/'),
        repo,
        git_ref,
        PAYLOAD_FILE
    )
}

/// Public page for a feature, embedded in review envelopes.
pub fn feature_link(site_base: &str, feature_name: &str) -> String {
    format!("{}/feature/{}", site_base.trim_end_matches('/'), feature_name)
}

/// Public page for a merge request, embedded in review envelopes.
pub fn merge_request_link(site_base: &str, feature_name: &str, merge_id: &str) -> String {
    format!(
        "{}/mergerequest/{}/{}",
        site_base.trim_end_matches('/'),
        feature_name,
        merge_id
    )
}

/// URL rendered by the screenshot host to produce the map preview image.
pub fn screenshot_url(site_base: &str, feature_name: &str, merge_id: &str) -> String {
    format!(
        "{}/screenshot/{}/{}",
        site_base.trim_end_matches('/'),
        feature_name,
        merge_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_idempotent() {
        assert_eq!(normalize("My Map"), "my-map");
        assert_eq!(normalize("my map"), "my-map");
        assert_eq!(normalize("my-map"), "my-map");
        assert_eq!(normalize(normalize("My Map").as_str()), "my-map");
    }

    #[test]
    fn test_feature_id_stable_across_calls() {
        assert_eq!(feature_id("Lake Tahoe Trails"), feature_id("lake tahoe trails"));
        assert_eq!(feature_id("Lake Tahoe Trails"), "lake-tahoe-trails");
    }

    #[test]
    fn test_revision_id_concatenates_normalized_parts() {
        assert_eq!(revision_id("My Map", "Draft One"), "my-mapdraft-one");
        assert_eq!(revision_id("my-map", "draft-one"), "my-mapdraft-one");
    }

    #[test]
    fn test_merge_ids_are_unique_and_prefixed() {
        let a = new_merge_id();
        let b = new_merge_id();
        assert!(a.starts_with("merge-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_raw_content_url_shape() {
        let url = raw_content_url("https://raw.mapflow.io", "my-map", "abc123");
        assert_eq!(url, "https://raw.mapflow.io/my-map/abc123/data.geojson");
    }

    #[test]
    fn test_raw_content_url_tolerates_trailing_slash() {
        let url = raw_content_url("https://raw.mapflow.io/", "my-map", "main");
        assert_eq!(url, "https://raw.mapflow.io/my-map/main/data.geojson");
    }

    #[test]
    fn test_site_links() {
        assert_eq!(
            feature_link("https://www.mapflow.io", "my-map"),
            "https://www.mapflow.io/feature/my-map"
        );
        assert_eq!(
            merge_request_link("https://www.mapflow.io", "my-map", "merge-1"),
            "https://www.mapflow.io/mergerequest/my-map/merge-1"
        );
        assert_eq!(
            screenshot_url("https://www.mapflow.io", "my-map", "merge-1"),
            "https://www.mapflow.io/screenshot/my-map/merge-1"
        );
    }
}
