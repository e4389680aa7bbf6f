//! Repository-level cascading configuration.
//!
//! Each repository may carry a `cascadingrc.json` file describing which
//! branches take part in the cascade and how the bot names its branches and
//! pull requests. Keys are camelCase; any key left out falls back to the
//! default below.
//!
//! ```json
//! {
//!   "cascadingBranchesPattern": "^release/\\d+\\.\\d+",
//!   "defaultBranch": "main",
//!   "bypassReviewers": true,
//!   "labels": ["cascading"]
//! }
//! ```

pub mod patterns;
pub mod service;

use serde::{Deserialize, Serialize};

pub use patterns::{BranchPatterns, ConfigError};
pub use service::{ServiceConfig, ServiceConfigError};

/// Paths probed for a configuration file, in priority order.
pub const CONFIGURATION_FILES: [&str; 4] = [
    ".github/cascadingrc.json",
    ".github/.cascadingrc.json",
    "cascadingrc.json",
    ".cascadingrc.json",
];

/// Prefix used for the intermediate branches created by the bot.
pub const CASCADING_BRANCH_PREFIX: &str = "cascading";

/// Per-repository cascading settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CascadingConfiguration {
    /// Prefix of the intermediate branch, as in `cascading/1.0.0-1.1.0`.
    pub branch_name_prefix: String,

    /// Regex selecting the branches that take part in the cascade.
    pub cascading_branches_pattern: String,

    /// Final branch of the chain. Empty means "the repository default branch".
    pub default_branch: String,

    /// Regexes of branches excluded from the cascade even if they match.
    pub ignored_patterns: Vec<String>,

    /// Regex whose first capture group extracts the version from a branch name.
    pub version_capture_pattern: String,

    /// Whether cascading PRs may be merged without review once checks pass.
    pub bypass_reviewers: bool,

    /// Labels added to every cascading PR.
    pub labels: Vec<String>,

    /// Title template; `$origin` and `$target` are substituted.
    pub pull_request_title: String,
}

impl Default for CascadingConfiguration {
    fn default() -> Self {
        CascadingConfiguration {
            branch_name_prefix: CASCADING_BRANCH_PREFIX.to_string(),
            cascading_branches_pattern: r"^releases?/\d+\.\d+".to_string(),
            default_branch: String::new(),
            ignored_patterns: Vec::new(),
            version_capture_pattern: r"/((?:0|[1-9]\d*)\.(?:0|[1-9]\d*)(?:\.0-[^ ]+)?)$"
                .to_string(),
            bypass_reviewers: false,
            labels: Vec::new(),
            pull_request_title: "[cascading] from $origin to $target".to_string(),
        }
    }
}

impl CascadingConfiguration {
    /// Parses the content of a configuration file.
    ///
    /// Missing keys take their default value; unknown keys are ignored.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Renders the pull request title for a hop from `origin` to `target`.
    pub fn pull_request_title(&self, origin: &str, target: &str) -> String {
        self.pull_request_title
            .replace("$origin", origin)
            .replace("$target", target)
    }

    /// Name of the intermediate branch carrying changes between two chain
    /// entries, e.g. `cascading/1.0.0-1.1.0`.
    pub fn cascading_branch_name(&self, from: &str, to: &str) -> String {
        format!("{}/{}-{}", self.branch_name_prefix, from, to)
    }

    /// Compiles the regexes of this configuration.
    pub fn patterns(&self) -> Result<BranchPatterns, ConfigError> {
        BranchPatterns::compile(self)
    }
}
