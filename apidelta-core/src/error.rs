//! Error type shared by the core library and the `apidelta` binary.

use thiserror::Error;

/// Fatal conditions that abort a run.
///
/// Missing blobs, undecodable content and malformed hunk headers are not
/// represented here: they are absorbed into the data model where they occur.
#[derive(Error, Debug)]
pub enum Error {
    /// The version-control backend failed (bad ref, not a repository).
    #[error("git {op} failed: {message}")]
    ExternalTool { op: String, message: String },

    #[error("store error: {0}")]
    Store(#[from] tokio_rusqlite::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("summary serialization error: {0}")]
    Summary(#[from] serde_json::Error),
}

impl Error {
    pub fn external_tool(op: impl Into<String>, message: impl ToString) -> Self {
        Error::ExternalTool { op: op.into(), message: message.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
