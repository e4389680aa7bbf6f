//! Merging cascading pull requests without waiting for reviews.

use crate::body::{BodyRenderer, is_bypass_cancelled};
use crate::effects::GitHubInterpreter;
use crate::types::{CheckConclusion, PrNumber};

use super::engine::{CascadeEngine, CascadeError};

/// What the bypass gate did with a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// `bypassReviewers` is off for the head branch.
    BypassDisabled,
    NotCascading,
    ChecksNotPassed,
    /// The pull request was closed in the meantime.
    Closed,
    /// A reviewer checked the cancel-bypass box.
    BypassCancelled,
    Merged,
    /// GitHub answered the merge request without merging.
    NotMerged,
}

impl<G, R> CascadeEngine<G, R>
where
    G: GitHubInterpreter + Sync,
    G::Error: std::error::Error + Send + Sync + 'static,
    R: BodyRenderer + Sync,
{
    /// Merges a bot pull request whose check suite just completed, when the
    /// configuration of `head_branch` allows bypassing reviews.
    pub async fn merge_cascading_pull_request(
        &self,
        pr: PrNumber,
        head_branch: &str,
        conclusion: &CheckConclusion,
    ) -> Result<GateOutcome, CascadeError> {
        let loaded = self.platform.load_configuration(Some(head_branch)).await?;
        if !loaded.config.bypass_reviewers {
            tracing::debug!("Reviewer bypass is disabled on {}", head_branch);
            return Ok(GateOutcome::BypassDisabled);
        }

        if !self.platform.is_cascading_pull_request(pr).await? {
            tracing::info!(pr = %pr, "The PR {} is not a cascading PR", pr);
            return Ok(GateOutcome::NotCascading);
        }

        if !self.platform.are_all_checks_passed(pr, conclusion) {
            tracing::warn!(
                pr = %pr,
                %conclusion,
                "The checks of the PR {} are not passed. The merge will be skipped",
                pr
            );
            return Ok(GateOutcome::ChecksNotPassed);
        }

        let current = self.platform.get_pull_request_from_id(pr).await?;
        if !current.is_open {
            tracing::info!(pr = %pr, "The PR {} is already closed. The merge will be skipped", pr);
            return Ok(GateOutcome::Closed);
        }
        if is_bypass_cancelled(&current.body) {
            tracing::info!(
                pr = %pr,
                "The PR {} is not allowing bypass. The merge will be skipped",
                pr
            );
            return Ok(GateOutcome::BypassCancelled);
        }

        if self.platform.merge_pull_request(pr).await? {
            tracing::info!(pr = %pr, "Merged cascading pull request");
            Ok(GateOutcome::Merged)
        } else {
            tracing::error!(pr = %pr, "Failed to merge the PR {}", pr);
            Ok(GateOutcome::NotMerged)
        }
    }
}
