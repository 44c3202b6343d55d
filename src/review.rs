//! Stakeholder review orchestrator
//!
//! Assembles and dispatches a sign-off envelope for a merge request:
//! content snapshot, tamper-evidence hash, rendered map preview, and the
//! recipient list, bundled for the e-signature host. Only after the host
//! has answered with an envelope id is anything persisted, so a failure
//! anywhere in assembly leaves no partial review state behind.
//!
//! The one unavoidable gap: a persistence failure after dispatch orphans
//! the envelope at the e-signature host. That case surfaces as a partial
//! failure carrying the envelope id so operators can reconcile.

use crate::error::AppError;
use crate::hosts::{EnvelopeRecipient, EnvelopeRequest};
use crate::identity;
use crate::models::{MergeRequest, User};
use crate::state::AppState;
use base64::Engine;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

/// Hex-encoded SHA-256 of a payload; stable for identical bytes.
pub fn sha256_hex(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Map stakeholders 1:1 onto envelope recipients.
fn recipients_from_users(stakeholders: &[User]) -> Vec<EnvelopeRecipient> {
    stakeholders
        .iter()
        .map(|stakeholder| EnvelopeRecipient {
            name: stakeholder.full_name(),
            email: stakeholder.email.clone(),
        })
        .collect()
}

pub struct ReviewOrchestrator;

impl ReviewOrchestrator {
    /// Request a stakeholder sign-off on a merge request.
    pub async fn request_review(
        state: &AppState,
        merge_id: &str,
        sender_name: &str,
        message: &str,
        stakeholders: Vec<User>,
    ) -> Result<MergeRequest, AppError> {
        let mut merge = state.store.get_merge(merge_id).await?;
        merge.ensure_open()?;
        if merge.review_in_progress() {
            return Err(AppError::ReviewPending(format!(
                "Merge request {} already has a review in progress",
                merge.id
            )));
        }

        let site_base = &state.settings.hosts.site_base;

        // Assemble the envelope; nothing is persisted until dispatch succeeds.
        let raw_data = state.content.fetch_raw(&merge.raw_url).await?;
        let content_hash = sha256_hex(&raw_data);
        let preview = state
            .screenshot
            .render(&identity::screenshot_url(site_base, &merge.feature_name, &merge.id))
            .await?;
        let preview_base64 = base64::engine::general_purpose::STANDARD.encode(&preview);

        let envelope = EnvelopeRequest {
            sender_name: sender_name.to_string(),
            message_from_sender: message.to_string(),
            map_feature_name: merge.feature_name.clone(),
            original_map_feature_link: identity::feature_link(site_base, &merge.feature_name),
            merge_request_link: identity::merge_request_link(
                site_base,
                &merge.feature_name,
                &merge.id,
            ),
            merge_requester_notes: merge.merge_requester_notes.clone(),
            stakeholder_review_start_date: Utc::now().to_rfc3339(),
            hash_of_merge_request_data: content_hash,
            raw_merge_request_data: raw_data,
            map_preview_image: preview_base64,
            recipients: recipients_from_users(&stakeholders),
        };

        let envelope_id = state.esign.submit_envelope(&envelope).await?;

        // The envelope now exists at the e-signature host; a failure below
        // orphans it, so name it in the error.
        merge.attach_review(envelope_id.clone(), message.to_string(), stakeholders)?;
        let merge = state.store.replace_merge(&merge).await.map_err(|err| {
            AppError::PartialFailure {
                completed: format!(
                    "envelope {} was dispatched to the e-signature host",
                    envelope_id
                ),
                message: err.to_string(),
            }
        })?;

        info!(merge_id = %merge.id, envelope_id = %envelope_id, "stakeholder review sent");
        Ok(merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests::{fixture, user};
    use crate::merge::MergeService;
    use crate::models::REVIEW_SENT;

    #[test]
    fn test_sha256_is_stable_and_sensitive() {
        let a = sha256_hex("{\"type\":\"FeatureCollection\"}");
        let b = sha256_hex("{\"type\":\"FeatureCollection\"}");
        let c = sha256_hex("{\"type\":\"featureCollection\"}");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_known_sha256_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_recipients_map_one_to_one() {
        let recipients = recipients_from_users(&[
            user("stan", "Stan", "Stakeholder"),
            user("sue", "Sue", "Signer"),
        ]);
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].name, "Stan Stakeholder");
        assert_eq!(recipients[0].email, "stan@example.com");
    }

    #[tokio::test]
    async fn test_request_review_attaches_envelope() {
        let fx = fixture().await;
        let merge = MergeService::create(&fx.state, "f1", "r1", String::new())
            .await
            .unwrap();

        let reviewed = ReviewOrchestrator::request_review(
            &fx.state,
            &merge.id,
            "Olive Owner",
            "please sign off",
            vec![user("stan", "Stan", "Stakeholder"), user("sue", "Sue", "Signer")],
        )
        .await
        .unwrap();

        let review = &reviewed.stakeholder_review;
        assert_eq!(review.envelope_id.as_deref(), Some("env-1"));
        assert_eq!(review.status.as_deref(), Some(REVIEW_SENT));
        assert_eq!(review.stakeholders.len(), 2);
        assert_eq!(
            review.message_to_stakeholders.as_deref(),
            Some("please sign off")
        );

        // Persisted, not just returned
        let stored = fx.state.store.get_merge(&merge.id).await.unwrap();
        assert_eq!(stored.stakeholder_review.envelope_id.as_deref(), Some("env-1"));
    }

    #[tokio::test]
    async fn test_second_review_request_conflicts() {
        let fx = fixture().await;
        let merge = MergeService::create(&fx.state, "f1", "r1", String::new())
            .await
            .unwrap();
        ReviewOrchestrator::request_review(&fx.state, &merge.id, "Olive", "first", vec![])
            .await
            .unwrap();

        let err = ReviewOrchestrator::request_review(&fx.state, &merge.id, "Olive", "again", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ReviewPending(_)));
    }

    #[tokio::test]
    async fn test_review_on_terminal_merge_conflicts() {
        let fx = fixture().await;
        let merge = MergeService::create(&fx.state, "f1", "r1", String::new())
            .await
            .unwrap();
        MergeService::deny(&fx.state, &merge.id).await.unwrap();

        let err = ReviewOrchestrator::request_review(&fx.state, &merge.id, "Olive", "late", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_review_on_missing_merge_is_not_found() {
        let fx = fixture().await;
        let err =
            ReviewOrchestrator::request_review(&fx.state, "merge-ghost", "Olive", "hi", vec![])
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
