//! The octocrab-backed [`GitHubInterpreter`](crate::effects::GitHubInterpreter).
//!
//! Failures are classified as transient or permanent; transient ones are
//! retried with exponential backoff before they reach the cascade engine.

mod client;
mod error;
mod interpreter;
mod retry;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
pub use retry::{RetryConfig, RetryPolicy, retry_with_backoff};
