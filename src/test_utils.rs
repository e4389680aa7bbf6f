//! Shared test utilities: generators for property-based tests and an
//! in-memory GitHub repository.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use proptest::prelude::*;

use crate::effects::{
    ComparisonData, GitHubEffect, GitHubInterpreter, GitHubResponse, InterpreterFactory, PrData,
    RepoSettingsData,
};
use crate::types::{CascadingPullRequestInfo, PrNumber, PrState, PullRequestContext, RepoId};

/// GitHub user ID the fake repository attributes bot pull requests to.
pub const BOT_USER_ID: u64 = 4242;

pub fn arb_branch_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9/._-]{0,30}".prop_map(String::from)
}

pub fn arb_context() -> impl Strategy<Value = PullRequestContext> {
    (
        arb_branch_name(),
        arb_branch_name(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(current, target, bypass, conflicting)| {
            PullRequestContext::new(current, target, bypass, conflicting)
        })
}

pub fn make_pr_info(number: u64, head: &str) -> CascadingPullRequestInfo {
    CascadingPullRequestInfo {
        id: PrNumber(number),
        body: String::new(),
        is_open: true,
        origin_branch_name: head.to_string(),
        mergeable: None,
        context: None,
        author_id: Some(BOT_USER_ID),
    }
}

pub fn make_pr_data(number: u64, head: &str, base: &str, body: &str) -> PrData {
    PrData {
        number: PrNumber(number),
        head_ref: head.to_string(),
        base_ref: base.to_string(),
        body: Some(body.to_string()),
        state: PrState::Open,
        mergeable: Some(true),
        author_id: Some(BOT_USER_ID),
        created_at: None,
    }
}

// ─── Fake Repository ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MockError(pub String);

#[derive(Debug)]
struct FakeRepo {
    default_branch: String,
    branches: Vec<String>,
    files: HashMap<String, String>,
    /// `(branch, target)` pairs where `branch` has commits `target` lacks.
    ahead: HashSet<(String, String)>,
    /// `(head, base)` merges that conflict.
    conflicts: HashSet<(String, String)>,
    prs: Vec<PrData>,
    labels: HashMap<PrNumber, Vec<String>>,
    next_pr: u64,
    /// Mergeability reported by `CreatePr`, then by later reads of that PR.
    new_pr_mergeable: (Option<bool>, Option<bool>),
    merge_accepted: bool,
    failing: HashSet<&'static str>,
    log: Vec<GitHubEffect>,
}

/// An in-memory repository answering effects the way GitHub would.
///
/// Clones share the same repository, so a test can keep a handle for
/// assertions while the engine owns another.
#[derive(Debug, Clone)]
pub struct MockGitHub {
    repo: Arc<Mutex<FakeRepo>>,
}

impl Default for MockGitHub {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitHub {
    pub fn new() -> Self {
        MockGitHub {
            repo: Arc::new(Mutex::new(FakeRepo {
                default_branch: "main".to_string(),
                branches: vec!["main".to_string()],
                files: HashMap::new(),
                ahead: HashSet::new(),
                conflicts: HashSet::new(),
                prs: Vec::new(),
                labels: HashMap::new(),
                next_pr: 1,
                new_pr_mergeable: (Some(true), Some(true)),
                merge_accepted: true,
                failing: HashSet::new(),
                log: Vec::new(),
            })),
        }
    }

    fn repo(&self) -> MutexGuard<'_, FakeRepo> {
        self.repo.lock().unwrap()
    }

    pub fn with_branches(self, branches: &[&str]) -> Self {
        self.repo().branches = branches.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.repo()
            .files
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_ahead(self, branch: &str, target: &str) -> Self {
        self.repo()
            .ahead
            .insert((branch.to_string(), target.to_string()));
        self
    }

    pub fn with_conflict(self, head: &str, base: &str) -> Self {
        self.repo()
            .conflicts
            .insert((head.to_string(), base.to_string()));
        self
    }

    pub fn with_pr(self, pr: PrData) -> Self {
        {
            let mut repo = self.repo();
            repo.next_pr = repo.next_pr.max(pr.number.0 + 1);
            repo.prs.push(pr);
        }
        self
    }

    pub fn with_new_pr_mergeable(self, on_create: Option<bool>, settled: Option<bool>) -> Self {
        self.repo().new_pr_mergeable = (on_create, settled);
        self
    }

    pub fn with_merge_declined(self) -> Self {
        self.repo().merge_accepted = false;
        self
    }

    pub fn failing(self, effect: &'static str) -> Self {
        self.repo().failing.insert(effect);
        self
    }

    /// Every effect interpreted so far, in order.
    pub fn effects(&self) -> Vec<GitHubEffect> {
        self.repo().log.clone()
    }

    /// Effects that change the repository.
    pub fn mutations(&self) -> Vec<GitHubEffect> {
        self.effects()
            .into_iter()
            .filter(|e| !e.is_read_only())
            .collect()
    }

    pub fn count(&self, effect_name: &str) -> usize {
        self.effects()
            .iter()
            .filter(|e| e.name() == effect_name)
            .count()
    }

    pub fn branches(&self) -> Vec<String> {
        self.repo().branches.clone()
    }

    pub fn prs(&self) -> Vec<PrData> {
        self.repo().prs.clone()
    }

    pub fn open_prs(&self) -> Vec<PrData> {
        self.prs()
            .into_iter()
            .filter(|pr| pr.state.is_open())
            .collect()
    }

    pub fn labels(&self, pr: PrNumber) -> Vec<String> {
        self.repo().labels.get(&pr).cloned().unwrap_or_default()
    }

    fn apply(&self, effect: GitHubEffect) -> Result<GitHubResponse, MockError> {
        let mut repo = self.repo();
        repo.log.push(effect.clone());

        if repo.failing.contains(effect.name()) {
            return Err(MockError(format!("{} failed", effect.name())));
        }

        let not_found = |what: String| MockError(format!("Not Found: {what}"));

        match effect {
            GitHubEffect::GetRepoSettings => Ok(GitHubResponse::RepoSettings(RepoSettingsData {
                default_branch: repo.default_branch.clone(),
            })),
            GitHubEffect::GetFileContent { path, .. } => {
                Ok(GitHubResponse::FileContent(repo.files.get(&path).cloned()))
            }
            GitHubEffect::ListBranches => Ok(GitHubResponse::Branches(repo.branches.clone())),
            GitHubEffect::CreateBranch { name, base } => {
                if !repo.branches.contains(&base) {
                    return Err(not_found(base));
                }
                if repo.branches.contains(&name) {
                    return Err(MockError("Reference already exists".to_string()));
                }
                repo.branches.push(name);
                Ok(GitHubResponse::BranchCreated)
            }
            GitHubEffect::DeleteBranch { name } => {
                let before = repo.branches.len();
                repo.branches.retain(|b| *b != name);
                if repo.branches.len() == before {
                    return Err(not_found(name));
                }
                Ok(GitHubResponse::BranchDeleted)
            }
            GitHubEffect::CompareBranches { base, head } => {
                let ahead_by = u64::from(repo.ahead.contains(&(head, base)));
                Ok(GitHubResponse::Comparison(ComparisonData {
                    ahead_by,
                    behind_by: 0,
                }))
            }
            GitHubEffect::MergeBranch { head, base } => {
                if repo.conflicts.contains(&(head, base)) {
                    return Err(MockError("Merge conflict".to_string()));
                }
                Ok(GitHubResponse::BranchMerged)
            }
            GitHubEffect::ListOpenPrs { head, base } => {
                let prs = repo
                    .prs
                    .iter()
                    .filter(|pr| pr.state.is_open())
                    .filter(|pr| head.as_ref().is_none_or(|h| pr.head_ref == *h))
                    .filter(|pr| base.as_ref().is_none_or(|b| pr.base_ref == *b))
                    .cloned()
                    .map(|pr| PrData {
                        mergeable: None,
                        ..pr
                    })
                    .collect();
                Ok(GitHubResponse::PrList(prs))
            }
            GitHubEffect::GetPr { pr } => repo
                .prs
                .iter()
                .find(|p| p.number == pr)
                .cloned()
                .map(GitHubResponse::Pr)
                .ok_or_else(|| not_found(pr.to_string())),
            GitHubEffect::CreatePr {
                head,
                base,
                title: _,
                body,
            } => {
                let number = PrNumber(repo.next_pr);
                repo.next_pr += 1;
                let (on_create, settled) = repo.new_pr_mergeable;
                let stored = PrData {
                    number,
                    head_ref: head,
                    base_ref: base,
                    body: Some(body),
                    state: PrState::Open,
                    mergeable: settled,
                    author_id: Some(BOT_USER_ID),
                    created_at: None,
                };
                repo.prs.push(stored.clone());
                Ok(GitHubResponse::Pr(PrData {
                    mergeable: on_create,
                    ..stored
                }))
            }
            GitHubEffect::UpdatePr { pr, body, .. } => {
                let stored = repo
                    .prs
                    .iter_mut()
                    .find(|p| p.number == pr)
                    .ok_or_else(|| not_found(pr.to_string()))?;
                stored.body = Some(body);
                Ok(GitHubResponse::Pr(stored.clone()))
            }
            GitHubEffect::AddLabels { pr, labels } => {
                repo.labels.entry(pr).or_default().extend(labels);
                Ok(GitHubResponse::LabelsAdded)
            }
            GitHubEffect::MergePr { pr } => {
                let accepted = repo.merge_accepted;
                let stored = repo
                    .prs
                    .iter_mut()
                    .find(|p| p.number == pr)
                    .ok_or_else(|| not_found(pr.to_string()))?;
                if accepted {
                    stored.state = PrState::Merged;
                }
                Ok(GitHubResponse::PrMerged { merged: accepted })
            }
        }
    }
}

impl GitHubInterpreter for MockGitHub {
    type Error = MockError;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        let result = self.apply(effect);
        async move { result }
    }
}

/// Every repository resolves to the same fake.
impl InterpreterFactory for MockGitHub {
    type Interpreter = MockGitHub;

    fn for_repo(&self, _repo: &RepoId) -> MockGitHub {
        self.clone()
    }
}
