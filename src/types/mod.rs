//! Core domain types for the cascade bot.

pub mod context;
pub mod ids;
pub mod pr;

pub use context::PullRequestContext;
pub use ids::{DeliveryId, PrNumber, RepoId};
pub use pr::{CascadingPullRequestInfo, CheckConclusion, PrState};
