//! Re-running a cascade once a conflicting hop has been resolved.

use crate::body::{BodyRenderer, decode_context, is_retrigger_cancelled};
use crate::effects::GitHubInterpreter;
use crate::types::PrNumber;

use super::engine::{CascadeEngine, CascadeError};

impl<G, R> CascadeEngine<G, R>
where
    G: GitHubInterpreter + Sync,
    G::Error: std::error::Error + Send + Sync + 'static,
    R: BodyRenderer + Sync,
{
    /// Given a merged pull request, returns the branch whose cascade must run
    /// again, if any.
    ///
    /// Only bot pull requests flagged as conflicting qualify, and reviewers
    /// can opt out with the re-cascading checkbox.
    pub async fn branch_to_reevaluate_cascading(
        &self,
        pr: PrNumber,
        body: &str,
    ) -> Result<Option<String>, CascadeError> {
        if !self.platform.is_cascading_pull_request(pr).await? {
            tracing::info!(pr = %pr, "The PR {} is not a cascading PR.", pr);
            return Ok(None);
        }

        let context = match decode_context(body)? {
            Some(context) if context.is_conflicting => context,
            _ => {
                tracing::info!(
                    pr = %pr,
                    "The PR {} did not report conflict, a cascading re-trigger is not required",
                    pr
                );
                return Ok(None);
            }
        };

        if is_retrigger_cancelled(body) {
            tracing::info!(
                pr = %pr,
                "The retrigger of cascading is cancelled for the PR {}",
                pr
            );
            return Ok(None);
        }

        Ok(Some(context.current_branch))
    }
}
