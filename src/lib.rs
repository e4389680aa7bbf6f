//! Release Cascade - a GitHub bot that carries changes forward through an
//! ordered chain of release branches.
//!
//! The crate is split into:
//! - `cascade`: the orchestration engine and its typed GitHub operations
//! - `body`: pull request bodies, which also persist each hop's context
//! - `config`: per-repository `cascadingrc` files and process settings
//! - `effects` / `github`: GitHub operations as data, and their octocrab
//!   interpreter
//! - `webhooks` / `server`: the HTTP intake that drives the engine

pub mod body;
pub mod cascade;
pub mod config;
pub mod effects;
pub mod github;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
