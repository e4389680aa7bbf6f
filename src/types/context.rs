//! The cascade context persisted inside pull request bodies.

use serde::{Deserialize, Serialize};

/// State of one cascade hop, stored as JSON in the PR body.
///
/// This is the only state the bot keeps between webhook deliveries. Field
/// names are camelCase on the wire so bodies written by earlier deployments
/// still decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestContext {
    /// Branch the changes come from.
    pub current_branch: String,

    /// Branch the PR merges into.
    pub target_branch: String,

    /// Whether the PR may be merged without reviews once checks pass.
    pub bypass_reviewers: bool,

    /// Set when the cascade stalled on a merge conflict for this hop.
    pub is_conflicting: bool,
}

impl PullRequestContext {
    pub fn new(
        current_branch: impl Into<String>,
        target_branch: impl Into<String>,
        bypass_reviewers: bool,
        is_conflicting: bool,
    ) -> Self {
        PullRequestContext {
            current_branch: current_branch.into(),
            target_branch: target_branch.into(),
            bypass_reviewers,
            is_conflicting,
        }
    }
}
