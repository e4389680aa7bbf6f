//! Pull request types as seen by the cascade engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::PullRequestContext;
use super::ids::PrNumber;

/// The lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    /// The PR is open.
    Open,
    /// The PR was merged.
    Merged,
    /// The PR was closed without merging.
    Closed,
}

impl PrState {
    pub fn is_open(&self) -> bool {
        matches!(self, PrState::Open)
    }
}

/// Conclusion of a completed check suite.
///
/// GitHub may add new conclusions; those are preserved verbatim in `Other`
/// and treated as not passed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    TimedOut,
    ActionRequired,
    Stale,
    Skipped,
    StartupFailure,
    #[serde(untagged)]
    Other(String),
}

impl CheckConclusion {
    /// Parses the conclusion string carried by check suite payloads.
    pub fn from_api_str(s: &str) -> Self {
        match s {
            "success" => CheckConclusion::Success,
            "failure" => CheckConclusion::Failure,
            "neutral" => CheckConclusion::Neutral,
            "cancelled" => CheckConclusion::Cancelled,
            "timed_out" => CheckConclusion::TimedOut,
            "action_required" => CheckConclusion::ActionRequired,
            "stale" => CheckConclusion::Stale,
            "skipped" => CheckConclusion::Skipped,
            "startup_failure" => CheckConclusion::StartupFailure,
            other => CheckConclusion::Other(other.to_string()),
        }
    }

    pub fn as_api_str(&self) -> &str {
        match self {
            CheckConclusion::Success => "success",
            CheckConclusion::Failure => "failure",
            CheckConclusion::Neutral => "neutral",
            CheckConclusion::Cancelled => "cancelled",
            CheckConclusion::TimedOut => "timed_out",
            CheckConclusion::ActionRequired => "action_required",
            CheckConclusion::Stale => "stale",
            CheckConclusion::Skipped => "skipped",
            CheckConclusion::StartupFailure => "startup_failure",
            CheckConclusion::Other(s) => s,
        }
    }

    /// Only `success` and `neutral` let a bypass merge go through.
    pub fn is_passing(&self) -> bool {
        matches!(self, CheckConclusion::Success | CheckConclusion::Neutral)
    }
}

impl fmt::Display for CheckConclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// A pull request together with the cascade context decoded from its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadingPullRequestInfo {
    pub id: PrNumber,

    /// Raw body; empty when the PR has no description.
    pub body: String,

    pub is_open: bool,

    /// Head branch of the PR (the cascading branch for bot-created PRs).
    pub origin_branch_name: String,

    /// `None` while GitHub is still computing mergeability.
    pub mergeable: Option<bool>,

    /// Context embedded in the body, absent for PRs opened by hand.
    pub context: Option<PullRequestContext>,

    /// GitHub user ID of the PR author.
    pub author_id: Option<u64>,
}
