//! Keeps the pull request of a hop in line with its branch.

use crate::body::BodyRenderer;
use crate::config::CascadingConfiguration;
use crate::effects::GitHubInterpreter;
use crate::types::{CascadingPullRequestInfo, PullRequestContext};

use super::engine::{CascadeEngine, CascadeError};

/// One step of the chain: `current_branch` flows into `target_branch` through
/// the intermediate `branch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub branch: String,
    pub current_branch: String,
    pub target_branch: String,
}

impl Hop {
    /// Context for a pull request of this hop that does not carry one yet.
    fn fresh_context(&self, config: &CascadingConfiguration, is_conflicting: bool) -> PullRequestContext {
        PullRequestContext::new(
            self.current_branch.as_str(),
            self.target_branch.as_str(),
            config.bypass_reviewers,
            is_conflicting,
        )
    }
}

impl<G, R> CascadeEngine<G, R>
where
    G: GitHubInterpreter + Sync,
    G::Error: std::error::Error + Send + Sync + 'static,
    R: BodyRenderer + Sync,
{
    async fn find_open_pull_request(
        &self,
        hop: &Hop,
    ) -> Result<Option<CascadingPullRequestInfo>, CascadeError> {
        let prs = self
            .platform
            .get_pull_requests(Some(&hop.branch), Some(&hop.target_branch))
            .await?;
        Ok(prs.into_iter().find(|pr| pr.is_open))
    }

    /// Opens the pull request of `hop`, or re-checks the one already open.
    pub async fn create_pull_request_with_message(
        &self,
        hop: &Hop,
        config: &CascadingConfiguration,
        is_conflicting: bool,
    ) -> Result<(), CascadeError> {
        tracing::debug!(
            "Creating Pull Request {} -> {}",
            hop.branch,
            hop.target_branch
        );

        if let Some(pr) = self.find_open_pull_request(hop).await? {
            tracing::warn!(
                pr = %pr.id,
                "Pull Request {} -> {} already exists. Creation will be skipped.",
                hop.branch,
                hop.target_branch
            );
            let context = pr
                .context
                .clone()
                .unwrap_or_else(|| hop.fresh_context(config, false));
            return self.update_message_when_non_mergeable(pr, context).await;
        }

        let title = config.pull_request_title(&hop.current_branch, &hop.target_branch);
        let body = self
            .renderer
            .render(&hop.fresh_context(config, is_conflicting), None);
        let pr = self
            .platform
            .create_pull_request(&hop.branch, &hop.target_branch, body, title, &config.labels)
            .await?;

        let context = pr
            .context
            .clone()
            .unwrap_or_else(|| hop.fresh_context(config, false));
        self.update_message_when_non_mergeable(pr, context).await
    }

    /// Flags the pull request of `hop` as conflicting so that merging it
    /// re-triggers the cascade of its origin branch.
    ///
    /// Without an open pull request the hop branch is recreated from the
    /// current branch first; a failure there is logged and the pull request
    /// is still opened.
    pub async fn add_trigger_to_pull_request(
        &self,
        hop: &Hop,
        config: &CascadingConfiguration,
    ) -> Result<(), CascadeError> {
        tracing::debug!("Run trigger to cascading PR from {}", hop.branch);

        if let Some(pr) = self.find_open_pull_request(hop).await? {
            let mut context = pr
                .context
                .clone()
                .unwrap_or_else(|| hop.fresh_context(config, true));
            context.is_conflicting = true;
            self.update_pull_request_with_new_message(&pr, context)
                .await?;
            return Ok(());
        }

        tracing::debug!("Will recreate the branch {}", hop.branch);
        let renewed = async {
            self.platform.delete_branch(&hop.branch).await?;
            self.platform
                .create_branch(&hop.branch, &hop.current_branch)
                .await
        };
        if let Err(e) = renewed.await {
            tracing::warn!(
                error = %e,
                "Failed to renew the cascading branch {}",
                hop.branch
            );
        }

        self.create_pull_request_with_message(hop, config, true)
            .await
    }

    /// Re-renders the body of `pr` when GitHub reports it cannot be merged.
    ///
    /// An unknown mergeability is asked for once more after the configured
    /// delay; it is not polled further.
    pub async fn update_message_when_non_mergeable(
        &self,
        pr: CascadingPullRequestInfo,
        context: PullRequestContext,
    ) -> Result<(), CascadeError> {
        let pr = match pr.mergeable {
            Some(true) => return Ok(()),
            Some(false) => pr,
            None => {
                tokio::time::sleep(self.mergeable_recheck_delay).await;
                self.platform.get_pull_request_from_id(pr.id).await?
            }
        };

        if pr.mergeable == Some(false) {
            self.update_pull_request_with_new_message(&pr, context)
                .await?;
        }
        Ok(())
    }

    /// Replaces the body of `pr`, never bypassing reviews once the body has
    /// to be rewritten.
    pub async fn update_pull_request_with_new_message(
        &self,
        pr: &CascadingPullRequestInfo,
        context: PullRequestContext,
    ) -> Result<CascadingPullRequestInfo, CascadeError> {
        tracing::debug!(pr = %pr.id, "Updating the pull request body");
        let context = PullRequestContext {
            bypass_reviewers: false,
            ..context
        };
        let body = self.renderer.render(&context, Some(pr));
        self.platform
            .update_pull_request_message(pr.id, body, None)
            .await
    }
}
