//! Git integration for apidelta.
//!
//! `GitRepo` owns the `git2::Repository` and answers the three questions a
//! run asks of version control: which commit a ref names, which files
//! changed between the fork point and HEAD, and what a file contained at
//! either commit.
pub mod repo;

pub use repo::{CommitSnapshots, GitRepo};
