//! Merge request lifecycle service
//!
//! Drives a merge request from creation through content updates to its
//! terminal outcome. The ordering discipline throughout: content-host
//! calls first, metadata writes second, so a crash can leave at most a
//! dangling branch without metadata, never metadata without a branch.
//!
//! Approval is not a content-host merge operation. The payload is a single
//! opaque file, so "merge" means copying the merge branch's snapshot onto
//! the feature's main line; the approval always wins over concurrent edits.

use crate::error::AppError;
use crate::identity;
use crate::models::MergeRequest;
use crate::state::AppState;
use tracing::{info, warn};

/// Wrap a follow-up error once durable side effects exist, naming them.
fn partial(completed: impl Into<String>) -> impl FnOnce(AppError) -> AppError {
    let completed = completed.into();
    move |err| match err {
        AppError::PartialFailure { .. } => err,
        other => AppError::PartialFailure {
            completed,
            message: other.to_string(),
        },
    }
}

pub struct MergeService;

impl MergeService {
    /// Propose merging a revision into its feature.
    ///
    /// The merge branch is cut from the revision's tip at this moment, so
    /// later edits to the revision do not silently alter the proposal.
    pub async fn create(
        state: &AppState,
        feature_name: &str,
        revision_name: &str,
        notes: String,
    ) -> Result<MergeRequest, AppError> {
        let feature_id = identity::feature_id(feature_name);
        let revision_id = identity::revision_id(feature_name, revision_name);

        let feature = state
            .store
            .find_feature(&feature_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No feature with that name exists".to_string()))?;
        let revision = state
            .store
            .find_revision(&revision_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No revision with that name exists".to_string()))?;

        let merge_id = identity::new_merge_id();
        let commit = state
            .content
            .create_branch(&feature.repo, &revision.revision_name, &merge_id)
            .await?;

        let raw_url = identity::raw_content_url(
            &state.settings.hosts.raw_content_base,
            &feature.repo,
            &commit.sha,
        );
        let merge = MergeRequest::new(
            merge_id,
            feature.id.clone(),
            revision.revision_name.clone(),
            raw_url,
            feature.owner.clone(),
            revision.owner.clone(),
            notes,
            feature.stakeholders.clone(),
        );
        state.store.create_merge(&merge).await?;
        info!(merge_id = %merge.id, feature = %feature.id, "merge request created");
        Ok(merge)
    }

    /// Push new content to the merge branch.
    ///
    /// Rejected outright while a stakeholder review is in flight. The
    /// gate is checked before any content-host call so a rejected update
    /// never mutates the branch.
    pub async fn update_content(
        state: &AppState,
        merge_id: &str,
        message: &str,
        payload: &str,
    ) -> Result<MergeRequest, AppError> {
        let mut merge = state.store.get_merge(merge_id).await?;
        merge.ensure_editable()?;

        let commit = state
            .content
            .put_file(&merge.feature_name, &merge.id, message, payload)
            .await?;
        let raw_url = identity::raw_content_url(
            &state.settings.hosts.raw_content_base,
            &merge.feature_name,
            &commit.sha,
        );
        merge.record_content_push(raw_url)?;
        state.store.replace_merge(&merge).await
    }

    /// Approve the merge request: copy the merge branch's snapshot onto the
    /// feature's main line, then record the terminal outcome.
    ///
    /// The feature and merge documents are written independently; once the
    /// snapshot has landed on main, failures surface as partial failures
    /// naming what committed. The feature write itself is re-appliable: a
    /// retry that produces the same addressed URL skips the store write.
    pub async fn approve(state: &AppState, merge_id: &str) -> Result<MergeRequest, AppError> {
        let mut merge = state.store.get_merge(merge_id).await?;
        merge.ensure_open()?;

        let snapshot = state.content.fetch_raw(&merge.raw_url).await?;
        let commit = state
            .content
            .put_file(
                &merge.feature_name,
                identity::MAIN_BRANCH,
                &format!("Merge {} into main", merge.id),
                &snapshot,
            )
            .await?;

        // The feature's main line now carries the merged snapshot; every
        // error below leaves durable state behind.
        let committed = format!(
            "the merged snapshot was pushed to feature {}'s main line",
            merge.feature_name
        );
        let mut feature = state
            .store
            .get_feature(&merge.feature_name)
            .await
            .map_err(partial(committed.clone()))?;
        let raw_url = identity::raw_content_url(
            &state.settings.hosts.raw_content_base,
            &feature.repo,
            &commit.sha,
        );
        if feature.record_content(raw_url) {
            state
                .store
                .replace_feature(&feature)
                .await
                .map_err(partial(committed.clone()))?;
        }

        merge.mark_approved()?;
        let merge = state
            .store
            .replace_merge(&merge)
            .await
            .map_err(partial(format!(
                "feature {} was updated with the merged content",
                feature.id
            )))?;

        info!(merge_id = %merge.id, feature = %feature.id, "merge request approved");
        Self::notify_requester(state, &merge, "approved").await;
        Ok(merge)
    }

    /// Deny the merge request. Metadata only; the content host is untouched.
    pub async fn deny(state: &AppState, merge_id: &str) -> Result<MergeRequest, AppError> {
        let mut merge = state.store.get_merge(merge_id).await?;
        merge.mark_denied()?;
        let merge = state.store.replace_merge(&merge).await?;

        info!(merge_id = %merge.id, "merge request denied");
        Self::notify_requester(state, &merge, "denied").await;
        Ok(merge)
    }

    /// Best-effort courtesy email to the requester; never fails the workflow.
    async fn notify_requester(state: &AppState, merge: &MergeRequest, outcome: &str) {
        let recipient = &merge.merge_requester.email;
        if recipient.is_empty() {
            return;
        }
        let subject = format!("Merge request {}", outcome);
        let body = format!(
            "Your merge request for feature {} was {}. {}",
            merge.feature_name,
            outcome,
            identity::merge_request_link(
                &state.settings.hosts.site_base,
                &merge.feature_name,
                &merge.id
            )
        );
        if let Err(err) = state.email.send(recipient, &subject, &body).await {
            warn!(merge_id = %merge.id, %err, "notification email failed");
        }
    }
}
