//! GitHub API effect types.
//!
//! These types describe the GitHub operations the cascade needs as data,
//! without executing them. `crate::github` executes them against the real
//! API; tests execute them against recording mocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PrNumber, PrState};

/// A GitHub API effect.
///
/// Effects are repo-scoped: the interpreter is constructed with a `RepoId`,
/// so effects don't include it. Branch names are bare (`release/1.0`), never
/// full refs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Repository ───────────────────────────────────────────────────────────
    /// Get repository settings (default branch).
    GetRepoSettings,

    /// Read a file from the repository. `reference` is a branch name; the
    /// default branch is used when absent.
    GetFileContent {
        path: String,
        reference: Option<String>,
    },

    // ─── Branches ─────────────────────────────────────────────────────────────
    /// List the names of all branches.
    ListBranches,

    /// Create `name` pointing at the current head of `base`.
    CreateBranch { name: String, base: String },

    /// Delete a branch.
    DeleteBranch { name: String },

    /// Compare two branches; `ahead_by` counts commits of `head` missing from `base`.
    CompareBranches { base: String, head: String },

    /// Merge `head` into the branch `base` (server-side merge commit).
    MergeBranch { head: String, base: String },

    // ─── Pull Requests ────────────────────────────────────────────────────────
    /// List open PRs, optionally filtered by head and base branch.
    ListOpenPrs {
        head: Option<String>,
        base: Option<String>,
    },

    /// Fetch a single PR by number.
    GetPr { pr: PrNumber },

    /// Open a PR from `head` into `base`.
    CreatePr {
        head: String,
        base: String,
        title: String,
        body: String,
    },

    /// Replace the body (and optionally the title) of a PR.
    UpdatePr {
        pr: PrNumber,
        body: String,
        title: Option<String>,
    },

    /// Add labels to a PR.
    AddLabels { pr: PrNumber, labels: Vec<String> },

    /// Merge a PR using the repository's default merge method.
    MergePr { pr: PrNumber },
}

impl GitHubEffect {
    /// Short name of the effect for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::GetRepoSettings => "get_repo_settings",
            GitHubEffect::GetFileContent { .. } => "get_file_content",
            GitHubEffect::ListBranches => "list_branches",
            GitHubEffect::CreateBranch { .. } => "create_branch",
            GitHubEffect::DeleteBranch { .. } => "delete_branch",
            GitHubEffect::CompareBranches { .. } => "compare_branches",
            GitHubEffect::MergeBranch { .. } => "merge_branch",
            GitHubEffect::ListOpenPrs { .. } => "list_open_prs",
            GitHubEffect::GetPr { .. } => "get_pr",
            GitHubEffect::CreatePr { .. } => "create_pr",
            GitHubEffect::UpdatePr { .. } => "update_pr",
            GitHubEffect::AddLabels { .. } => "add_labels",
            GitHubEffect::MergePr { .. } => "merge_pr",
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            GitHubEffect::GetRepoSettings
                | GitHubEffect::GetFileContent { .. }
                | GitHubEffect::ListBranches
                | GitHubEffect::CompareBranches { .. }
                | GitHubEffect::ListOpenPrs { .. }
                | GitHubEffect::GetPr { .. }
        )
    }

    /// Whether running the effect a second time after it took effect
    /// succeeds and leaves the repository unchanged. Creating a branch or a
    /// PR twice fails with 422, and merging twice fails with 405.
    pub fn is_idempotent(&self) -> bool {
        self.is_read_only() || matches!(self, GitHubEffect::UpdatePr { .. })
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// PR data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrData {
    pub number: PrNumber,
    pub head_ref: String,
    pub base_ref: String,
    /// The PR description, if any.
    pub body: Option<String>,
    pub state: PrState,
    /// `None` when GitHub has not computed mergeability yet. List endpoints
    /// never report it.
    pub mergeable: Option<bool>,
    pub author_id: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Repository settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSettingsData {
    pub default_branch: String,
}

/// Result of comparing two branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonData {
    pub ahead_by: u64,
    pub behind_by: u64,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetRepoSettings`.
    RepoSettings(RepoSettingsData),

    /// Response to `GetFileContent`; `None` when the file does not exist.
    FileContent(Option<String>),

    /// Response to `ListBranches`.
    Branches(Vec<String>),

    /// Response to `CreateBranch`.
    BranchCreated,

    /// Response to `DeleteBranch`.
    BranchDeleted,

    /// Response to `CompareBranches`.
    Comparison(ComparisonData),

    /// Response to `MergeBranch`.
    BranchMerged,

    /// Response to `ListOpenPrs`, oldest first.
    PrList(Vec<PrData>),

    /// Response to `GetPr`, `CreatePr` and `UpdatePr`.
    Pr(PrData),

    /// Response to `AddLabels`.
    LabelsAdded,

    /// Response to `MergePr`.
    PrMerged { merged: bool },
}
