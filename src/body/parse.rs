//! Extraction of the embedded cascade context from a PR body.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::types::PullRequestContext;

/// First `<!-- {...} -->` block of the body, spanning lines.
static CONTEXT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--\s*(\{.*?\})\s*-->").expect("static regex is valid"));

/// A context block was found but could not be decoded.
#[derive(Debug, Error)]
#[error("corrupt cascade context in pull request body: {0}")]
pub struct ContextError(#[from] pub serde_json::Error);

/// Decodes the cascade context embedded in a PR body.
///
/// Returns `Ok(None)` when the body carries no context block, which is the
/// case for pull requests opened by hand. A block that is present but does
/// not hold a valid context is an error: the bot's only state is corrupt.
pub fn decode_context(body: &str) -> Result<Option<PullRequestContext>, ContextError> {
    let Some(json) = CONTEXT_BLOCK
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    else {
        warn!("No cascade context found in pull request body");
        return Ok(None);
    };

    Ok(Some(serde_json::from_str(json)?))
}
