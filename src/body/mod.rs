//! Pull request bodies: the bot's only persistent storage.
//!
//! Every cascading PR embeds its [`PullRequestContext`](crate::types::PullRequestContext)
//! as JSON in an HTML comment, next to a human-readable explanation and the
//! checkboxes that let reviewers opt out of automation.

pub mod format;
pub mod markers;
pub mod parse;

pub use format::{BodyRenderer, MarkdownBodyRenderer, encode_context};
pub use markers::{
    CANCEL_BYPASS_REVIEWERS_MARK, CANCEL_RETRIGGER_CASCADING_MARK, is_bypass_cancelled,
    is_retrigger_cancelled,
};
pub use parse::{ContextError, decode_context};
