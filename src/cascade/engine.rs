//! The cascade orchestrator.
//!
//! `CascadeEngine::cascade` carries the changes of one branch into the next
//! branch of the chain, through an intermediate `cascading/…` branch and a
//! pull request. Runs are stateless: everything the engine needs to resume
//! lives in the branches and pull request bodies on GitHub.

use std::time::Duration;

use thiserror::Error;

use crate::body::{BodyRenderer, ContextError, MarkdownBodyRenderer};
use crate::config::ConfigError;
use crate::effects::GitHubInterpreter;

use super::ordering::order_branches;
use super::platform::Platform;
use super::sync::Hop;

/// How long to wait before asking GitHub again for a mergeability it has not
/// computed yet.
pub const DEFAULT_MERGEABLE_RECHECK_DELAY: Duration = Duration::from_millis(3000);

/// Errors that abort a cascade run.
#[derive(Debug, Error)]
pub enum CascadeError {
    /// A GitHub call failed (after the adapter's own retries).
    #[error("GitHub {operation} failed: {source}")]
    GitHub {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The interpreter answered an effect with the wrong kind of response.
    #[error("unexpected response to {operation}: {response}")]
    UnexpectedResponse {
        operation: &'static str,
        response: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Where a cascade run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    /// The branch is neither a cascading branch nor the default branch.
    NotApplicable,

    /// The branch matches an ignored pattern.
    Ignored,

    /// The branch should be in the chain but was left out of it, usually
    /// because its version could not be parsed.
    NotInChain,

    /// The branch is the last one of the chain.
    EndOfChain,

    /// The next branch already contains every commit of this one.
    NotAhead { target: String },

    /// The hop branch is up to date and its pull request exists.
    Synchronized { hop_branch: String, target: String },

    /// Merging into the existing hop branch conflicted; its pull request was
    /// flagged so the cascade runs again once it is merged.
    Conflicting { hop_branch: String, target: String },
}

/// Orchestrates cascades for one repository.
pub struct CascadeEngine<G, R = MarkdownBodyRenderer> {
    pub(super) platform: Platform<G>,
    pub(super) renderer: R,
    pub(super) mergeable_recheck_delay: Duration,
}

impl<G> CascadeEngine<G> {
    /// Creates an engine rendering the default Markdown bodies.
    ///
    /// `bot_user_id` identifies pull requests opened by the bot; without it no
    /// pull request is ever considered a cascading one.
    pub fn new(github: G, bot_user_id: Option<u64>) -> Self {
        CascadeEngine {
            platform: Platform::new(github, bot_user_id),
            renderer: MarkdownBodyRenderer,
            mergeable_recheck_delay: DEFAULT_MERGEABLE_RECHECK_DELAY,
        }
    }
}

impl<G, R> CascadeEngine<G, R> {
    pub fn with_renderer<R2: BodyRenderer>(self, renderer: R2) -> CascadeEngine<G, R2> {
        CascadeEngine {
            platform: self.platform,
            renderer,
            mergeable_recheck_delay: self.mergeable_recheck_delay,
        }
    }

    pub fn with_mergeable_recheck_delay(mut self, delay: Duration) -> Self {
        self.mergeable_recheck_delay = delay;
        self
    }
}

impl<G, R> CascadeEngine<G, R>
where
    G: GitHubInterpreter + Sync,
    G::Error: std::error::Error + Send + Sync + 'static,
    R: BodyRenderer + Sync,
{
    /// Cascades `current_branch` into the next branch of the chain.
    ///
    /// Skips are not errors: every early stop is reported through the
    /// returned [`CascadeOutcome`]. A merge conflict on the hop branch is
    /// handled here and never surfaces as an error.
    pub async fn cascade(&self, current_branch: &str) -> Result<CascadeOutcome, CascadeError> {
        tracing::debug!(branch = current_branch, "Run cascading");
        let loaded = self.platform.load_configuration(Some(current_branch)).await?;
        let (config, patterns) = (&loaded.config, &loaded.patterns);

        if !patterns.is_candidate(current_branch) {
            tracing::info!(
                "Skip cascading because the branch \"{}\" does not match \"{}\"",
                current_branch,
                patterns.cascading_pattern()
            );
            return Ok(CascadeOutcome::NotApplicable);
        }

        if patterns.is_ignored(current_branch) {
            tracing::info!(
                "Skip cascading because the branch \"{}\" is ignored",
                current_branch
            );
            return Ok(CascadeOutcome::Ignored);
        }

        tracing::info!(branch = current_branch, "Cascading plugin execution");
        let branches = self.platform.get_branches().await?;
        let chain = order_branches(&branches, patterns);

        let Some(index) = chain.iter().position(|d| d.branch == current_branch) else {
            tracing::error!(
                "The branch {} is not part of the list of cascading branches. The process will stop.",
                current_branch
            );
            return Ok(CascadeOutcome::NotInChain);
        };
        let Some(next) = chain.get(index + 1) else {
            tracing::info!(
                "The branch {} is the last branch of the cascading. The process will stop.",
                current_branch
            );
            return Ok(CascadeOutcome::EndOfChain);
        };

        let current = &chain[index];
        let hop = Hop {
            branch: config.cascading_branch_name(&current.label(), &next.label()),
            current_branch: current.branch.clone(),
            target_branch: next.branch.clone(),
        };

        if !self
            .platform
            .is_branch_ahead(&hop.current_branch, &hop.target_branch)
            .await?
        {
            tracing::info!(
                "{} is not ahead of {}. The cascading process will be skipped",
                hop.current_branch,
                hop.target_branch
            );
            return Ok(CascadeOutcome::NotAhead {
                target: hop.target_branch,
            });
        }

        if branches.contains(&hop.branch) {
            if let Err(e) = self.platform.merge(&hop.current_branch, &hop.branch).await {
                tracing::warn!(
                    error = %e,
                    "Fail to merge {} into {}, will retry when merged",
                    hop.current_branch,
                    hop.branch
                );
                self.add_trigger_to_pull_request(&hop, config).await?;
                return Ok(CascadeOutcome::Conflicting {
                    hop_branch: hop.branch,
                    target: hop.target_branch,
                });
            }
        } else {
            self.platform
                .create_branch(&hop.branch, &hop.current_branch)
                .await?;
        }

        self.create_pull_request_with_message(&hop, config, false)
            .await?;
        Ok(CascadeOutcome::Synchronized {
            hop_branch: hop.branch,
            target: hop.target_branch,
        })
    }
}
