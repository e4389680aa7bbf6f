//! Typed repository operations on top of a [`GitHubInterpreter`].
//!
//! The engine speaks in branches and pull requests; this layer turns those
//! calls into effects and checks that each effect got the response it should.

use futures::future::join_all;

use crate::body::decode_context;
use crate::config::{BranchPatterns, CONFIGURATION_FILES, CascadingConfiguration};
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, PrData};
use crate::types::{CascadingPullRequestInfo, CheckConclusion, PrNumber};

use super::engine::CascadeError;

/// Configuration of one run, with its patterns compiled.
#[derive(Debug, Clone)]
pub struct LoadedConfiguration {
    pub config: CascadingConfiguration,
    pub patterns: BranchPatterns,
}

/// Repository operations used by the cascade engine.
#[derive(Debug)]
pub struct Platform<G> {
    github: G,
    /// GitHub user ID the bot's pull requests are authored by.
    bot_user_id: Option<u64>,
}

fn unexpected(operation: &'static str, response: GitHubResponse) -> CascadeError {
    CascadeError::UnexpectedResponse {
        operation,
        response: format!("{response:?}"),
    }
}

impl<G> Platform<G> {
    pub fn new(github: G, bot_user_id: Option<u64>) -> Self {
        Platform {
            github,
            bot_user_id,
        }
    }
}

impl<G> Platform<G>
where
    G: GitHubInterpreter + Sync,
    G::Error: std::error::Error + Send + Sync + 'static,
{
    async fn call(&self, effect: GitHubEffect) -> Result<GitHubResponse, CascadeError> {
        let operation = effect.name();
        self.github
            .interpret(effect)
            .await
            .map_err(|e| CascadeError::GitHub {
                operation,
                source: Box::new(e),
            })
    }

    fn pull_request_info(data: PrData) -> Result<CascadingPullRequestInfo, CascadeError> {
        let body = data.body.unwrap_or_default();
        let context = decode_context(&body)?;
        Ok(CascadingPullRequestInfo {
            id: data.number,
            is_open: data.state.is_open(),
            origin_branch_name: data.head_ref,
            mergeable: data.mergeable,
            author_id: data.author_id,
            context,
            body,
        })
    }

    // ─── Configuration ────────────────────────────────────────────────────────

    /// Loads the cascading configuration as seen from `branch` (the default
    /// branch of the repository when `None`).
    ///
    /// A missing or unreadable file yields the default configuration; an empty
    /// `defaultBranch` is filled from the repository settings.
    pub async fn load_configuration(
        &self,
        branch: Option<&str>,
    ) -> Result<LoadedConfiguration, CascadeError> {
        tracing::debug!(branch, "Loading cascading configuration");
        let reference = branch.map(|b| format!("refs/heads/{b}"));

        let probes = CONFIGURATION_FILES.iter().map(|path| {
            self.call(GitHubEffect::GetFileContent {
                path: (*path).to_string(),
                reference: reference.clone(),
            })
        });

        let mut found = Vec::new();
        for (path, response) in CONFIGURATION_FILES.iter().zip(join_all(probes).await) {
            match response? {
                GitHubResponse::FileContent(Some(content)) => found.push((*path, content)),
                GitHubResponse::FileContent(None) => {}
                other => return Err(unexpected("get_file_content", other)),
            }
        }

        let mut config = match found.first() {
            None => {
                tracing::warn!("No configuration file found, the default configuration will be used");
                CascadingConfiguration::default()
            }
            Some((path, content)) => {
                if found.len() > 1 {
                    tracing::warn!(
                        files = ?found.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
                        used = path,
                        "Several configuration files found, only the first one is considered"
                    );
                }
                match CascadingConfiguration::from_json(content) {
                    Ok(config) => {
                        tracing::debug!(path, "Found configuration");
                        config
                    }
                    Err(e) => {
                        tracing::warn!(
                            path,
                            error = %e,
                            "Failed to parse the configuration, the default configuration will be used"
                        );
                        CascadingConfiguration::default()
                    }
                }
            }
        };

        if config.default_branch.is_empty() {
            tracing::debug!("No default branch configured, using the repository default");
            config.default_branch = self.repository_default_branch().await?;
        }

        let patterns = config.patterns()?;
        tracing::debug!(?config, "Configuration loaded");
        Ok(LoadedConfiguration { config, patterns })
    }

    async fn repository_default_branch(&self) -> Result<String, CascadeError> {
        match self.call(GitHubEffect::GetRepoSettings).await? {
            GitHubResponse::RepoSettings(settings) => Ok(settings.default_branch),
            other => Err(unexpected("get_repo_settings", other)),
        }
    }

    // ─── Branches ─────────────────────────────────────────────────────────────

    pub async fn get_branches(&self) -> Result<Vec<String>, CascadeError> {
        tracing::debug!("Listing remote branches");
        match self.call(GitHubEffect::ListBranches).await? {
            GitHubResponse::Branches(branches) => Ok(branches),
            other => Err(unexpected("list_branches", other)),
        }
    }

    /// Creates `name` at the head of `base`.
    pub async fn create_branch(&self, name: &str, base: &str) -> Result<(), CascadeError> {
        tracing::debug!(branch = name, base, "Creating branch");
        match self
            .call(GitHubEffect::CreateBranch {
                name: name.to_string(),
                base: base.to_string(),
            })
            .await?
        {
            GitHubResponse::BranchCreated => Ok(()),
            other => Err(unexpected("create_branch", other)),
        }
    }

    pub async fn delete_branch(&self, name: &str) -> Result<(), CascadeError> {
        tracing::debug!(branch = name, "Deleting branch");
        match self
            .call(GitHubEffect::DeleteBranch {
                name: name.to_string(),
            })
            .await?
        {
            GitHubResponse::BranchDeleted => Ok(()),
            other => Err(unexpected("delete_branch", other)),
        }
    }

    /// True when `branch` has commits that `target` lacks.
    pub async fn is_branch_ahead(&self, branch: &str, target: &str) -> Result<bool, CascadeError> {
        match self
            .call(GitHubEffect::CompareBranches {
                base: target.to_string(),
                head: branch.to_string(),
            })
            .await?
        {
            GitHubResponse::Comparison(comparison) => {
                tracing::debug!(
                    branch,
                    target,
                    ahead_by = comparison.ahead_by,
                    behind_by = comparison.behind_by,
                    "Compared branches"
                );
                Ok(comparison.ahead_by > 0)
            }
            other => Err(unexpected("compare_branches", other)),
        }
    }

    /// Merges `source` into `into`. A conflict is reported as an error.
    pub async fn merge(&self, source: &str, into: &str) -> Result<(), CascadeError> {
        match self
            .call(GitHubEffect::MergeBranch {
                head: source.to_string(),
                base: into.to_string(),
            })
            .await?
        {
            GitHubResponse::BranchMerged => Ok(()),
            other => Err(unexpected("merge_branch", other)),
        }
    }

    // ─── Pull Requests ────────────────────────────────────────────────────────

    /// Open pull requests from `head` into `base`, oldest first.
    pub async fn get_pull_requests(
        &self,
        head: Option<&str>,
        base: Option<&str>,
    ) -> Result<Vec<CascadingPullRequestInfo>, CascadeError> {
        let response = self
            .call(GitHubEffect::ListOpenPrs {
                head: head.map(str::to_string),
                base: base.map(str::to_string),
            })
            .await?;
        let GitHubResponse::PrList(mut prs) = response else {
            return Err(unexpected("list_open_prs", response));
        };

        prs.retain(|pr| {
            head.is_none_or(|h| pr.head_ref == h) && base.is_none_or(|b| pr.base_ref == b)
        });
        prs.sort_by_key(|pr| pr.created_at);

        prs.into_iter()
            .map(|mut pr| {
                // Listings never carry a computed mergeability.
                pr.mergeable = None;
                Self::pull_request_info(pr)
            })
            .collect()
    }

    pub async fn get_pull_request_from_id(
        &self,
        id: PrNumber,
    ) -> Result<CascadingPullRequestInfo, CascadeError> {
        match self.call(GitHubEffect::GetPr { pr: id }).await? {
            GitHubResponse::Pr(pr) => Self::pull_request_info(pr),
            other => Err(unexpected("get_pr", other)),
        }
    }

    /// Opens a pull request and attaches `labels` when there are any.
    pub async fn create_pull_request(
        &self,
        head: &str,
        base: &str,
        body: String,
        title: String,
        labels: &[String],
    ) -> Result<CascadingPullRequestInfo, CascadeError> {
        let response = self
            .call(GitHubEffect::CreatePr {
                head: head.to_string(),
                base: base.to_string(),
                title,
                body,
            })
            .await?;
        let GitHubResponse::Pr(pr) = response else {
            return Err(unexpected("create_pr", response));
        };
        tracing::info!(pr = %pr.number, head, base, "Created cascading pull request");

        if !labels.is_empty() {
            match self
                .call(GitHubEffect::AddLabels {
                    pr: pr.number,
                    labels: labels.to_vec(),
                })
                .await?
            {
                GitHubResponse::LabelsAdded => {}
                other => return Err(unexpected("add_labels", other)),
            }
        }

        Self::pull_request_info(pr)
    }

    /// Replaces the body, and the title when given, of a pull request.
    pub async fn update_pull_request_message(
        &self,
        id: PrNumber,
        body: String,
        title: Option<String>,
    ) -> Result<CascadingPullRequestInfo, CascadeError> {
        match self
            .call(GitHubEffect::UpdatePr {
                pr: id,
                body,
                title,
            })
            .await?
        {
            GitHubResponse::Pr(pr) => Self::pull_request_info(pr),
            other => Err(unexpected("update_pr", other)),
        }
    }

    /// True when the pull request was opened by the bot. Always false when no
    /// bot identity is configured.
    pub async fn is_cascading_pull_request(&self, id: PrNumber) -> Result<bool, CascadeError> {
        let Some(bot_user_id) = self.bot_user_id else {
            return Ok(false);
        };
        match self.call(GitHubEffect::GetPr { pr: id }).await? {
            GitHubResponse::Pr(pr) => Ok(pr.author_id == Some(bot_user_id)),
            other => Err(unexpected("get_pr", other)),
        }
    }

    /// The check-suite conclusion delivered with the event is trusted as is.
    pub fn are_all_checks_passed(&self, id: PrNumber, conclusion: &CheckConclusion) -> bool {
        tracing::debug!(pr = %id, %conclusion, "Evaluating check suite conclusion");
        conclusion.is_passing()
    }

    /// Merges a pull request; `false` when GitHub declined to merge it.
    pub async fn merge_pull_request(&self, id: PrNumber) -> Result<bool, CascadeError> {
        match self.call(GitHubEffect::MergePr { pr: id }).await? {
            GitHubResponse::PrMerged { merged } => Ok(merged),
            other => Err(unexpected("merge_pr", other)),
        }
    }
}
