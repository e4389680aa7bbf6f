//! Cascading of release branches.
//!
//! A repository's cascading branches form a chain ordered by version:
//!
//! ```text
//! release/1.0 ──► release/1.1 ──► release/2.0 ──► main
//! ```
//!
//! When a branch receives commits, [`CascadeEngine::cascade`] merges it into an
//! intermediate `cascading/<from>-<to>` branch and opens (or refreshes) a pull
//! request from there into the next branch. Merging that pull request pushes to
//! the next branch, which cascades in turn.
//!
//! # Module layout
//!
//! - `ordering`: which branches form the chain, and in which order
//! - `platform`: typed repository operations over a `GitHubInterpreter`
//! - `engine`: the orchestrator and its outcome/error types
//! - `sync`: creating and refreshing the pull request of a hop
//! - `retrigger`: re-running a cascade after a conflicting hop is merged
//! - `gate`: merging bot pull requests without reviews once checks pass

pub mod engine;
pub mod gate;
pub mod ordering;
pub mod platform;
pub mod retrigger;
pub mod sync;


pub use engine::{CascadeEngine, CascadeError, CascadeOutcome, DEFAULT_MERGEABLE_RECHECK_DELAY};
pub use gate::GateOutcome;
pub use ordering::{BranchDescriptor, format_version, order_branches, parse_version};
pub use platform::{LoadedConfiguration, Platform};
pub use sync::Hop;
