//! Newtype wrappers for identifiers.
//!
//! These keep pull request numbers, repositories and webhook deliveries from
//! being mixed up with plain integers and strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pull request number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PrNumber {
    fn from(n: u64) -> Self {
        PrNumber(n)
    }
}

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A GitHub webhook delivery ID, used to correlate log lines for one event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub String);

impl DeliveryId {
    pub fn new(s: impl Into<String>) -> Self {
        DeliveryId(s.into())
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pr_number_displays_with_hash(n: u64) {
            prop_assert_eq!(PrNumber(n).to_string(), format!("#{}", n));
        }

        #[test]
        fn pr_number_serializes_as_bare_integer(n: u64) {
            let json = serde_json::to_string(&PrNumber(n)).unwrap();
            prop_assert_eq!(json, n.to_string());
        }

        #[test]
        fn repo_id_displays_as_slug(
            owner in "[a-zA-Z][a-zA-Z0-9-]{0,38}",
            repo in "[a-zA-Z][a-zA-Z0-9_.-]{0,99}"
        ) {
            let id = RepoId::new(&owner, &repo);
            prop_assert_eq!(id.to_string(), format!("{}/{}", owner, repo));
        }
    }

    #[test]
    fn pr_numbers_order_numerically() {
        let mut prs = vec![PrNumber(12), PrNumber(3), PrNumber(7)];
        prs.sort();
        assert_eq!(prs, vec![PrNumber(3), PrNumber(7), PrNumber(12)]);
    }

    #[test]
    fn delivery_id_is_transparent() {
        let id = DeliveryId::new("72d3162e-cc78-11e3-81ab-4c9367dc0958");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"72d3162e-cc78-11e3-81ab-4c9367dc0958\""
        );
        assert_eq!(id.to_string(), "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    }
}
