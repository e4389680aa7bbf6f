//! Ordering of the cascading branches.
//!
//! The chain is every branch selected by the configuration, sorted by the
//! semantic version embedded in its name, with the unversioned default branch
//! closing the chain:
//!
//! ```text
//! release/1.0 → release/1.1 → release/2.0 → main
//! ```

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::config::BranchPatterns;

/// First `major[.minor[.patch]]` run of digits in a version token.
static LOOSE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("static regex is valid")
});

/// A branch of the chain and the version extracted from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDescriptor {
    pub branch: String,

    /// `None` for the default branch.
    pub version: Option<Version>,
}

impl BranchDescriptor {
    /// The label used in cascading branch names: the formatted version, or the
    /// branch name itself for the default branch.
    pub fn label(&self) -> String {
        match &self.version {
            Some(version) => format_version(version),
            None => self.branch.clone(),
        }
    }
}

/// `major.minor.patch[-pre]`, without build metadata.
pub fn format_version(version: &Version) -> String {
    if version.pre.is_empty() {
        format!("{}.{}.{}", version.major, version.minor, version.patch)
    } else {
        format!(
            "{}.{}.{}-{}",
            version.major, version.minor, version.patch, version.pre
        )
    }
}

/// Parses a version token, strictly first and then loosely: `1.2` becomes
/// `1.2.0` and `v3` becomes `3.0.0`.
pub fn parse_version(token: &str) -> Option<Version> {
    if let Ok(version) = Version::parse(token) {
        return Some(version);
    }

    let caps = LOOSE_VERSION.captures(token)?;
    let part = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

fn compare(a: &BranchDescriptor, b: &BranchDescriptor) -> Ordering {
    match (&a.version, &b.version) {
        (Some(x), Some(y)) => x.cmp_precedence(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Computes the cascade chain from the full list of repository branches.
///
/// Branches whose version cannot be extracted are left out with a warning.
/// The sort is stable, so branches with equal precedence keep their listing
/// order.
pub fn order_branches<S: AsRef<str>>(
    branches: &[S],
    patterns: &BranchPatterns,
) -> Vec<BranchDescriptor> {
    tracing::debug!(
        branches = ?branches.iter().map(AsRef::as_ref).collect::<Vec<_>>(),
        "Sorting the full list of branches"
    );

    let mut chain: Vec<BranchDescriptor> = branches
        .iter()
        .map(AsRef::as_ref)
        .filter(|branch| patterns.is_candidate(branch))
        .filter(|branch| !patterns.is_ignored(branch))
        .filter_map(|branch| {
            if patterns.is_default_branch(branch) {
                return Some(BranchDescriptor {
                    branch: branch.to_string(),
                    version: None,
                });
            }

            let version = patterns.capture_version(branch).and_then(parse_version);
            if version.is_none() {
                tracing::warn!(
                    branch,
                    "Failed to parse the branch version, it will be skipped from cascading"
                );
            }
            version.map(|version| BranchDescriptor {
                branch: branch.to_string(),
                version: Some(version),
            })
        })
        .collect();

    chain.sort_by(compare);

    tracing::debug!(
        chain = ?chain.iter().map(|d| d.branch.as_str()).collect::<Vec<_>>(),
        "Discovered branches to cascade"
    );
    chain
}
