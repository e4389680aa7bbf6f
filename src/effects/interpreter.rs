//! The seam between cascade logic and GitHub.

use std::future::Future;

use crate::types::RepoId;

use super::github::{GitHubEffect, GitHubResponse};

/// Carries out [`GitHubEffect`]s for one repository.
///
/// The cascade engine never names a concrete client: production runs use the
/// octocrab interpreter, tests use an in-memory repository.
///
/// ```ignore
/// struct FixedBranches(Vec<String>);
///
/// impl GitHubInterpreter for FixedBranches {
///     type Error = std::convert::Infallible;
///
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
///         Ok(match effect {
///             GitHubEffect::ListBranches => GitHubResponse::Branches(self.0.clone()),
///             other => panic!("unsupported effect {}", other.name()),
///         })
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    type Error;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}

/// Builds an interpreter scoped to one repository.
///
/// Webhooks can come from any repository the app is installed on, so the
/// dispatcher asks for a fresh interpreter per event.
pub trait InterpreterFactory: Send + Sync + 'static {
    type Interpreter: GitHubInterpreter + Send + Sync + 'static;

    fn for_repo(&self, repo: &RepoId) -> Self::Interpreter;
}
