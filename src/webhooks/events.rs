//! Typed webhook events.
//!
//! Only the three deliveries that drive a cascade are represented:
//!
//! - `push` to a branch: cascade that branch
//! - `check_suite` completed: run the bypass gate on each pull request
//! - `pull_request` closed and merged: maybe re-run a conflicting cascade

use crate::types::{CheckConclusion, PrNumber, RepoId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Commits landed on a branch.
    Push { repo: RepoId, branch: String },

    /// A check suite finished on a commit shared by `pull_requests`.
    CheckSuiteCompleted {
        repo: RepoId,
        /// `None` when GitHub sent no conclusion.
        conclusion: Option<CheckConclusion>,
        pull_requests: Vec<CheckedPullRequest>,
    },

    /// A pull request was merged.
    PullRequestMerged {
        repo: RepoId,
        pr: PrNumber,
        body: String,
    },
}

/// A pull request attached to a check suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedPullRequest {
    pub number: PrNumber,
    pub head_branch: String,
}

impl WebhookEvent {
    pub fn repo(&self) -> &RepoId {
        match self {
            WebhookEvent::Push { repo, .. }
            | WebhookEvent::CheckSuiteCompleted { repo, .. }
            | WebhookEvent::PullRequestMerged { repo, .. } => repo,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookEvent::Push { .. } => "push",
            WebhookEvent::CheckSuiteCompleted { .. } => "check_suite_completed",
            WebhookEvent::PullRequestMerged { .. } => "pull_request_merged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_and_kind_are_available_for_every_event() {
        let repo = RepoId::new("octo", "app");
        let events = [
            WebhookEvent::Push {
                repo: repo.clone(),
                branch: "main".to_string(),
            },
            WebhookEvent::CheckSuiteCompleted {
                repo: repo.clone(),
                conclusion: None,
                pull_requests: vec![],
            },
            WebhookEvent::PullRequestMerged {
                repo: repo.clone(),
                pr: PrNumber(1),
                body: String::new(),
            },
        ];
        for event in &events {
            assert_eq!(event.repo(), &repo);
        }
        let kinds: Vec<_> = events.iter().map(WebhookEvent::kind).collect();
        assert_eq!(kinds, ["push", "check_suite_completed", "pull_request_merged"]);
    }
}
