//! Octocrab client wrapper scoped to a single repository.

use octocrab::Octocrab;

use crate::effects::InterpreterFactory;
use crate::types::RepoId;

/// The GitHub API as seen from one repository.
///
/// `Octocrab` shares its HTTP client between clones, so every repository the
/// bot hears about is served by the same authenticated connection pool.
#[derive(Clone)]
pub struct OctocrabClient {
    api: Octocrab,
    repo: RepoId,
}

impl OctocrabClient {
    pub fn new(api: Octocrab, repo: RepoId) -> Self {
        OctocrabClient { api, repo }
    }

    pub fn api(&self) -> &Octocrab {
        &self.api
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }

    /// `/repos/{owner}/{repo}` followed by `suffix`.
    pub(crate) fn route(&self, suffix: &str) -> String {
        format!("/repos/{}{suffix}", self.repo)
    }
}

// The token lives inside `Octocrab`; only the repository is worth printing.
impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OctocrabClient({})", self.repo)
    }
}

impl InterpreterFactory for Octocrab {
    type Interpreter = OctocrabClient;

    fn for_repo(&self, repo: &RepoId) -> OctocrabClient {
        OctocrabClient::new(self.clone(), repo.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Building `Octocrab` spawns its connection pool, hence the runtime.
    #[tokio::test]
    async fn routes_are_scoped_to_the_repository() {
        let api = Octocrab::builder().build().unwrap();
        let client = api.for_repo(&RepoId::new("octo", "app"));

        assert_eq!(client.route("/branches"), "/repos/octo/app/branches");
        assert_eq!(format!("{client:?}"), "OctocrabClient(octo/app)");
    }
}
