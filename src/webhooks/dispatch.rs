//! Routing parsed webhook events to the cascade engine.
//!
//! | Event | Action |
//! |-------|--------|
//! | push | `cascade(branch)` |
//! | check suite completed | bypass gate on each pull request, concurrently |
//! | pull request merged | re-trigger evaluation, then `cascade` when needed |

use std::time::Duration;

use futures::future::join_all;
use tracing::{error, info};

use crate::cascade::{
    CascadeEngine, CascadeError, CascadeOutcome, DEFAULT_MERGEABLE_RECHECK_DELAY, GateOutcome,
};
use crate::effects::{GitHubInterpreter, InterpreterFactory};
use crate::types::{CheckConclusion, PrNumber, RepoId};

use super::events::{CheckedPullRequest, WebhookEvent};

/// What handling an event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Cascaded(CascadeOutcome),

    /// Gate result per pull request, in payload order. `None` marks a pull
    /// request whose gate failed; the failure has been logged.
    Gated(Vec<(PrNumber, Option<GateOutcome>)>),

    /// The merged pull request does not call for another cascade.
    NoRetrigger,
}

/// Turns webhook events into engine calls, one repository-scoped engine per
/// event.
pub struct Dispatcher<F> {
    factory: F,
    bot_user_id: Option<u64>,
    mergeable_recheck_delay: Duration,
}

impl<F> Dispatcher<F>
where
    F: InterpreterFactory,
    <F::Interpreter as GitHubInterpreter>::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(factory: F, bot_user_id: Option<u64>) -> Self {
        Dispatcher {
            factory,
            bot_user_id,
            mergeable_recheck_delay: DEFAULT_MERGEABLE_RECHECK_DELAY,
        }
    }

    pub fn with_mergeable_recheck_delay(mut self, delay: Duration) -> Self {
        self.mergeable_recheck_delay = delay;
        self
    }

    fn engine(&self, repo: &RepoId) -> CascadeEngine<F::Interpreter> {
        CascadeEngine::new(self.factory.for_repo(repo), self.bot_user_id)
            .with_mergeable_recheck_delay(self.mergeable_recheck_delay)
    }

    #[tracing::instrument(skip_all, fields(repo = %event.repo(), event = event.kind()))]
    pub async fn dispatch(&self, event: WebhookEvent) -> Result<Dispatched, CascadeError> {
        let engine = self.engine(event.repo());

        match event {
            WebhookEvent::Push { branch, .. } => {
                engine.cascade(&branch).await.map(Dispatched::Cascaded)
            }
            WebhookEvent::CheckSuiteCompleted {
                conclusion,
                pull_requests,
                ..
            } => {
                // Suites that never ran carry no conclusion; they cannot pass.
                let conclusion = conclusion.unwrap_or_else(|| CheckConclusion::Other(String::new()));
                Ok(Dispatched::Gated(
                    gate_all(&engine, pull_requests, &conclusion).await,
                ))
            }
            WebhookEvent::PullRequestMerged { pr, body, .. } => {
                match engine.branch_to_reevaluate_cascading(pr, &body).await? {
                    Some(branch) => {
                        info!(pr = %pr, branch = %branch, "Re-triggering cascade");
                        engine.cascade(&branch).await.map(Dispatched::Cascaded)
                    }
                    None => Ok(Dispatched::NoRetrigger),
                }
            }
        }
    }
}

/// Runs the bypass gate on every pull request at once. A failure on one pull
/// request is logged and does not affect the others.
async fn gate_all<G>(
    engine: &CascadeEngine<G>,
    pull_requests: Vec<CheckedPullRequest>,
    conclusion: &CheckConclusion,
) -> Vec<(PrNumber, Option<GateOutcome>)>
where
    G: GitHubInterpreter + Sync,
    G::Error: std::error::Error + Send + Sync + 'static,
{
    let gates = pull_requests.into_iter().map(|pr| async move {
        let result = engine
            .merge_cascading_pull_request(pr.number, &pr.head_branch, conclusion)
            .await;
        match result {
            Ok(outcome) => (pr.number, Some(outcome)),
            Err(e) => {
                error!(pr = %pr.number, error = %e, "Bypass merge failed");
                (pr.number, None)
            }
        }
    });
    join_all(gates).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyRenderer, MarkdownBodyRenderer};
    use crate::effects::GitHubEffect;
    use crate::test_utils::{BOT_USER_ID, MockGitHub, make_pr_data};
    use crate::types::{PrState, PullRequestContext};

    const CONFIG_PATH: &str = ".github/cascadingrc.json";
    const HOP: &str = "cascading/1.0.0-1.1.0";

    fn repo() -> RepoId {
        RepoId::new("octo", "app")
    }

    fn dispatcher(github: &MockGitHub) -> Dispatcher<MockGitHub> {
        Dispatcher::new(github.clone(), Some(BOT_USER_ID))
            .with_mergeable_recheck_delay(Duration::ZERO)
    }

    fn release_repo() -> MockGitHub {
        MockGitHub::new().with_branches(&["main", "release/1.0", "release/1.1"])
    }

    fn body(bypass: bool, conflicting: bool) -> String {
        MarkdownBodyRenderer.render(
            &PullRequestContext::new("release/1.0", "release/1.1", bypass, conflicting),
            None,
        )
    }

    #[tokio::test]
    async fn push_cascades_the_branch() {
        let github = release_repo().with_ahead("release/1.0", "release/1.1");

        let dispatched = dispatcher(&github)
            .dispatch(WebhookEvent::Push {
                repo: repo(),
                branch: "release/1.0".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            dispatched,
            Dispatched::Cascaded(CascadeOutcome::Synchronized {
                hop_branch: HOP.to_string(),
                target: "release/1.1".to_string(),
            })
        );
        assert_eq!(github.open_prs().len(), 1);
    }

    #[tokio::test]
    async fn push_errors_are_returned() {
        let github = release_repo().failing("list_branches");

        let err = dispatcher(&github)
            .dispatch(WebhookEvent::Push {
                repo: repo(),
                branch: "release/1.0".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CascadeError::GitHub {
                operation: "list_branches",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn check_suite_gates_each_pull_request_in_isolation() {
        let github = release_repo()
            .with_file(CONFIG_PATH, r#"{"bypassReviewers": true}"#)
            .with_pr(make_pr_data(3, HOP, "release/1.1", &body(true, false)));

        let dispatched = dispatcher(&github)
            .dispatch(WebhookEvent::CheckSuiteCompleted {
                repo: repo(),
                conclusion: Some(CheckConclusion::Success),
                pull_requests: vec![
                    CheckedPullRequest {
                        number: PrNumber(3),
                        head_branch: HOP.to_string(),
                    },
                    // Unknown to the repository: its gate fails.
                    CheckedPullRequest {
                        number: PrNumber(99),
                        head_branch: HOP.to_string(),
                    },
                ],
            })
            .await
            .unwrap();

        assert_eq!(
            dispatched,
            Dispatched::Gated(vec![
                (PrNumber(3), Some(GateOutcome::Merged)),
                (PrNumber(99), None),
            ])
        );
        assert_eq!(github.prs()[0].state, PrState::Merged);
    }

    #[tokio::test]
    async fn check_suite_without_conclusion_never_merges() {
        let github = release_repo()
            .with_file(CONFIG_PATH, r#"{"bypassReviewers": true}"#)
            .with_pr(make_pr_data(3, HOP, "release/1.1", &body(true, false)));

        let dispatched = dispatcher(&github)
            .dispatch(WebhookEvent::CheckSuiteCompleted {
                repo: repo(),
                conclusion: None,
                pull_requests: vec![CheckedPullRequest {
                    number: PrNumber(3),
                    head_branch: HOP.to_string(),
                }],
            })
            .await
            .unwrap();

        assert_eq!(
            dispatched,
            Dispatched::Gated(vec![(PrNumber(3), Some(GateOutcome::ChecksNotPassed))])
        );
        assert_eq!(github.count("merge_pr"), 0);
    }

    #[tokio::test]
    async fn merged_conflicting_pull_request_runs_the_cascade_again() {
        let conflicting = body(false, true);
        let mut merged = make_pr_data(5, HOP, "release/1.1", &conflicting);
        merged.state = PrState::Merged;
        let github = release_repo()
            .with_ahead("release/1.0", "release/1.1")
            .with_pr(merged);

        let dispatched = dispatcher(&github)
            .dispatch(WebhookEvent::PullRequestMerged {
                repo: repo(),
                pr: PrNumber(5),
                body: conflicting,
            })
            .await
            .unwrap();

        assert!(matches!(
            dispatched,
            Dispatched::Cascaded(CascadeOutcome::Synchronized { .. })
        ));
        assert!(
            github
                .mutations()
                .iter()
                .any(|e| matches!(e, GitHubEffect::CreateBranch { name, .. } if name == HOP))
        );
        assert_eq!(github.open_prs().len(), 1);
    }

    #[tokio::test]
    async fn merged_clean_pull_request_stops_there() {
        let clean = body(false, false);
        let github = release_repo().with_pr(make_pr_data(5, HOP, "release/1.1", &clean));

        let dispatched = dispatcher(&github)
            .dispatch(WebhookEvent::PullRequestMerged {
                repo: repo(),
                pr: PrNumber(5),
                body: clean,
            })
            .await
            .unwrap();

        assert_eq!(dispatched, Dispatched::NoRetrigger);
        assert!(github.mutations().is_empty());
    }
}
