//! apidelta: audits API-surface changes between a base ref and HEAD.
//!
//! The binary wires [`cli`] and [`config`] into a [`pipeline`] run that
//! reads the repository through [`git`] and persists the result with
//! `apidelta_core`.
pub mod cli;
pub mod config;
pub mod git;
pub mod pipeline;

pub use cli::{build_options, Args};
pub use config::Config;
pub use pipeline::{collect_run, execute, RunOptions};
