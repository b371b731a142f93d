//! Core of `apidelta`: turns two snapshots of a source tree into a
//! queryable table of added and removed API symbols.
//!
//! Pipeline, leaves first: [`scrub`] neutralizes comments and literals,
//! [`hunk`] structures diff text, [`extract`] finds declarations,
//! [`snapshot`] runs extraction per file and version, [`differ`] compares
//! the two symbol tables, and [`db`] persists a run.
pub mod db;
pub mod differ;
pub mod error;
pub mod extract;
pub mod hunk;
pub mod schema;
pub mod scrub;
pub mod snapshot;
pub mod summary;
pub mod types;

pub use db::Store;
pub use error::{Error, Result};
pub use snapshot::{SnapshotBuilder, SnapshotSource};
