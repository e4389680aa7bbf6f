//! Classified GitHub API failures.
//!
//! The retry loop only needs to know whether trying again can help:
//! server errors, rate limiting and dropped connections can; everything else
//! GitHub rejects (validation errors, missing resources, merge conflicts)
//! cannot.

use thiserror::Error;

const RATE_LIMIT_HINTS: [&str; 3] = ["rate limit", "secondary rate", "abuse detection"];
const NETWORK_HINTS: [&str; 5] = ["timeout", "timed out", "connection", "network", "dns"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    Transient,
    Permanent,
}

impl GitHubErrorKind {
    /// Decides from the HTTP status, when GitHub answered at all, and the
    /// error message.
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let message = message.to_lowercase();
        let mentions = |hints: &[&str]| hints.iter().any(|hint| message.contains(hint));

        match status {
            Some(429) | Some(500..=599) => GitHubErrorKind::Transient,
            Some(403) if mentions(&RATE_LIMIT_HINTS) => GitHubErrorKind::Transient,
            None if mentions(&NETWORK_HINTS) => GitHubErrorKind::Transient,
            _ => GitHubErrorKind::Permanent,
        }
    }

    pub fn is_retriable(&self) -> bool {
        *self == GitHubErrorKind::Transient
    }
}

#[derive(Debug, Error)]
#[error(
    "GitHub API error{}: {message}",
    .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,
    /// `None` when the request never got an HTTP answer.
    pub status: Option<u16>,
    pub message: String,
    #[source]
    pub source: Option<octocrab::Error>,
}

impl GitHubApiError {
    pub fn permanent(message: impl Into<String>) -> Self {
        GitHubApiError {
            kind: GitHubErrorKind::Permanent,
            status: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        GitHubApiError {
            kind: GitHubErrorKind::Transient,
            ..Self::permanent(message)
        }
    }

    pub fn with_status(self, status: u16) -> Self {
        GitHubApiError {
            status: Some(status),
            ..self
        }
    }

    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let (status, message) = match &err {
            octocrab::Error::GitHub { source, .. } => {
                (Some(source.status_code.as_u16()), source.message.clone())
            }
            other => (None, other.to_string()),
        };

        GitHubApiError {
            kind: GitHubErrorKind::classify(status, &message),
            status,
            message,
            source: Some(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}
