//! Effects-as-data for GitHub operations.
//!
//! The cascade logic describes what it wants done as [`GitHubEffect`] values
//! and hands them to a [`GitHubInterpreter`]. This enables:
//! - Testability via recording mock interpreters
//! - Logging of intended operations
//! - Retry policy living in one place (the production interpreter)

pub mod github;
pub mod interpreter;

pub use github::{ComparisonData, GitHubEffect, GitHubResponse, PrData, RepoSettingsData};
pub use interpreter::{GitHubInterpreter, InterpreterFactory};
