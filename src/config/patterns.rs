//! Compiled branch-selection regexes.

use regex::Regex;
use thiserror::Error;

use super::CascadingConfiguration;

/// Errors raised while turning a configuration into usable patterns.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One of the configured regexes does not compile.
    #[error("invalid {field} pattern {pattern:?}: {source}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// The regexes of a [`CascadingConfiguration`], compiled once per run.
#[derive(Debug, Clone)]
pub struct BranchPatterns {
    cascading: Regex,
    version_capture: Regex,
    ignored: Vec<Regex>,
    default_branch: String,
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        field,
        pattern: pattern.to_string(),
        source,
    })
}

impl BranchPatterns {
    pub fn compile(config: &CascadingConfiguration) -> Result<Self, ConfigError> {
        Ok(BranchPatterns {
            cascading: compile("cascadingBranchesPattern", &config.cascading_branches_pattern)?,
            version_capture: compile("versionCapturePattern", &config.version_capture_pattern)?,
            ignored: config
                .ignored_patterns
                .iter()
                .map(|p| compile("ignoredPatterns", p))
                .collect::<Result<_, _>>()?,
            default_branch: config.default_branch.clone(),
        })
    }

    /// Source text of the cascading pattern, for log messages.
    pub fn cascading_pattern(&self) -> &str {
        self.cascading.as_str()
    }

    pub fn is_default_branch(&self, branch: &str) -> bool {
        !self.default_branch.is_empty() && branch == self.default_branch
    }

    /// True when the branch matches the cascading pattern or is the default branch.
    pub fn is_candidate(&self, branch: &str) -> bool {
        self.cascading.is_match(branch) || self.is_default_branch(branch)
    }

    pub fn is_ignored(&self, branch: &str) -> bool {
        self.ignored.iter().any(|p| p.is_match(branch))
    }

    /// Extracts the version token of a branch using the first capture group.
    pub fn capture_version<'a>(&self, branch: &'a str) -> Option<&'a str> {
        self.version_capture
            .captures(branch)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
    }
}
