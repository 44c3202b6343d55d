//! Merge request entity and lifecycle state machine
//!
//! A merge request proposes folding a revision back into its feature's
//! canonical content line. Its lifecycle:
//!
//! `Created` (no envelope) → `ReviewRequested` (envelope present)
//! → terminal `Approved` | `Denied`
//!
//! The first two states are derived: the presence of an e-signature
//! envelope id on the embedded review sub-record is the sole gate between
//! free content editing and review-guarded editing. Only the terminal
//! outcome is stored in `status`, and once set it never changes; further
//! work requires a new merge request.

use crate::error::AppError;
use crate::models::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review status text recorded once an envelope has been dispatched.
pub const REVIEW_SENT: &str = "Review sent";

/// Terminal outcome of a merge request. `None` on the entity means the
/// request is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStatus {
    Approved,
    Denied,
}

/// Embedded record of a stakeholder sign-off request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderReview {
    /// Envelope id at the e-signature host; absent means no review in progress
    pub envelope_id: Option<String>,
    pub status: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
    pub message_to_stakeholders: Option<String>,
    #[serde(default)]
    pub stakeholders: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// `merge-<uuid>`; random, unlike feature/revision ids
    pub id: String,
    pub feature_name: String,
    pub revision_name: String,
    /// Content-addressed URL of the merge branch snapshot
    pub raw_url: String,
    /// Terminal outcome; `None` while the request is open
    pub status: Option<MergeStatus>,
    /// The feature's owner at creation time
    pub owner: User,
    /// The revision's owner, who proposed the merge
    pub merge_requester: User,
    #[serde(default)]
    pub merge_requester_notes: String,
    #[serde(default)]
    pub contributors: Vec<User>,
    pub stakeholder_review: StakeholderReview,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    /// Optimistic-concurrency token, incremented by the store on replace
    #[serde(default)]
    pub version: u64,
}

impl MergeRequest {
    /// Create an open merge request. The stakeholder list is seeded from
    /// the feature's current stakeholders so later changes to the feature
    /// do not silently alter who reviews this request.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        feature_name: String,
        revision_name: String,
        raw_url: String,
        owner: User,
        merge_requester: User,
        merge_requester_notes: String,
        stakeholders: Vec<User>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            feature_name,
            revision_name,
            raw_url,
            status: None,
            owner,
            merge_requester,
            merge_requester_notes,
            contributors: Vec::new(),
            stakeholder_review: StakeholderReview {
                stakeholders,
                ..Default::default()
            },
            created_date: now,
            last_modified_date: now,
            version: 0,
        }
    }

    /// A dispatched envelope guards the merge branch against edits.
    pub fn review_in_progress(&self) -> bool {
        self.stakeholder_review.envelope_id.is_some()
    }

    /// Gate for content mutation: open and not under review.
    pub fn ensure_editable(&self) -> Result<(), AppError> {
        self.ensure_open()?;
        if self.review_in_progress() {
            return Err(AppError::ReviewPending(format!(
                "Merge request {} is under stakeholder review; content updates are rejected until the review concludes",
                self.id
            )));
        }
        Ok(())
    }

    /// Gate for any transition out of the open state.
    pub fn ensure_open(&self) -> Result<(), AppError> {
        if let Some(status) = self.status {
            return Err(AppError::Conflict(format!(
                "Merge request {} is already {:?} and cannot be changed",
                self.id, status
            )));
        }
        Ok(())
    }

    /// Record a content push to the merge branch: rewrite the addressed URL
    /// to the new commit and bump the modification timestamp.
    pub fn record_content_push(&mut self, raw_url: String) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.raw_url = raw_url;
        self.last_modified_date = Utc::now();
        Ok(())
    }

    /// Attach a dispatched review envelope to this request.
    pub fn attach_review(
        &mut self,
        envelope_id: String,
        message: String,
        stakeholders: Vec<User>,
    ) -> Result<(), AppError> {
        self.ensure_open()?;
        if self.review_in_progress() {
            return Err(AppError::ReviewPending(format!(
                "Merge request {} already has a review in progress",
                self.id
            )));
        }
        self.stakeholder_review = StakeholderReview {
            envelope_id: Some(envelope_id),
            status: Some(REVIEW_SENT.to_string()),
            created_date: Some(Utc::now()),
            message_to_stakeholders: Some(message),
            stakeholders,
        };
        self.last_modified_date = Utc::now();
        Ok(())
    }

    /// Terminal transition: approved.
    pub fn mark_approved(&mut self) -> Result<(), AppError> {
        self.ensure_open()?;
        self.status = Some(MergeStatus::Approved);
        self.last_modified_date = Utc::now();
        Ok(())
    }

    /// Terminal transition: denied.
    pub fn mark_denied(&mut self) -> Result<(), AppError> {
        self.ensure_open()?;
        self.status = Some(MergeStatus::Denied);
        self.last_modified_date = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> User {
        User {
            guid: Some("u-owner".to_string()),
            first_name: "Olive".to_string(),
            last_name: "Owner".to_string(),
            email: "olive@example.com".to_string(),
        }
    }

    fn requester() -> User {
        User {
            guid: Some("u-req".to_string()),
            first_name: "Rex".to_string(),
            last_name: "Requester".to_string(),
            email: "rex@example.com".to_string(),
        }
    }

    fn open_merge() -> MergeRequest {
        MergeRequest::new(
            "merge-123".to_string(),
            "my-map".to_string(),
            "draft".to_string(),
            "https://raw.mapflow.io/my-map/merge-123/data.geojson".to_string(),
            owner(),
            requester(),
            "please merge".to_string(),
            vec![owner()],
        )
    }

    #[test]
    fn test_new_merge_has_no_envelope_and_seeded_stakeholders() {
        let merge = open_merge();
        assert!(merge.stakeholder_review.envelope_id.is_none());
        assert_eq!(merge.stakeholder_review.stakeholders.len(), 1);
        assert!(merge.status.is_none());
    }

    #[test]
    fn test_content_push_allowed_while_no_review() {
        let mut merge = open_merge();
        merge
            .record_content_push("https://raw.mapflow.io/my-map/abc/data.geojson".to_string())
            .unwrap();
        assert!(merge.raw_url.contains("/abc/"));
    }

    #[test]
    fn test_content_push_rejected_while_review_in_progress() {
        let mut merge = open_merge();
        merge
            .attach_review("env-1".to_string(), "look".to_string(), vec![owner()])
            .unwrap();
        let url_before = merge.raw_url.clone();
        let err = merge
            .record_content_push("https://raw.mapflow.io/my-map/def/data.geojson".to_string())
            .unwrap_err();
        assert!(matches!(err, AppError::ReviewPending(_)));
        assert_eq!(merge.raw_url, url_before);
    }

    #[test]
    fn test_attach_review_sets_sub_record() {
        let mut merge = open_merge();
        merge
            .attach_review("env-9".to_string(), "review this".to_string(), vec![owner(), requester()])
            .unwrap();
        let review = &merge.stakeholder_review;
        assert_eq!(review.envelope_id.as_deref(), Some("env-9"));
        assert_eq!(review.status.as_deref(), Some(REVIEW_SENT));
        assert_eq!(review.stakeholders.len(), 2);
        assert!(review.created_date.is_some());
    }

    #[test]
    fn test_second_review_rejected() {
        let mut merge = open_merge();
        merge
            .attach_review("env-1".to_string(), "first".to_string(), vec![owner()])
            .unwrap();
        let err = merge
            .attach_review("env-2".to_string(), "second".to_string(), vec![owner()])
            .unwrap_err();
        assert!(matches!(err, AppError::ReviewPending(_)));
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut approved = open_merge();
        approved.mark_approved().unwrap();
        assert!(approved.mark_denied().is_err());
        assert!(approved.mark_approved().is_err());
        assert!(approved
            .record_content_push("https://raw.mapflow.io/x/y/data.geojson".to_string())
            .is_err());
        assert!(approved
            .attach_review("env".to_string(), "m".to_string(), vec![])
            .is_err());

        let mut denied = open_merge();
        denied.mark_denied().unwrap();
        assert!(denied.mark_approved().is_err());
        assert_eq!(denied.status, Some(MergeStatus::Denied));
    }
}
