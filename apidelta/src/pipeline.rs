//! One base-vs-HEAD audit run, from repository to store.
//!
//! All repository reads and symbol computation finish before the store is
//! opened, so a git failure never touches the previous run's data.

use std::path::{Path, PathBuf};

use apidelta_core::differ::diff_symbols;
use apidelta_core::hunk::parse_hunks;
use apidelta_core::summary::Summary;
use apidelta_core::types::{ChangeType, DiffMetadata, RunRecord};
use apidelta_core::{Result, SnapshotBuilder, Store};
use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::git::GitRepo;

/// Head side of every comparison.
pub const HEAD_REF: &str = "HEAD";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub repo: PathBuf,
    pub base: String,
    pub extensions: Vec<String>,
    pub detect_renames: bool,
}

/// Reads the repository and computes everything a run stores.
///
/// # Errors
///
/// Returns [`apidelta_core::Error::ExternalTool`] when the path is not a
/// repository or a ref does not resolve.
pub fn collect_run(opts: &RunOptions) -> Result<RunRecord> {
    let git = GitRepo::open(&std::path::absolute(&opts.repo)?)?;
    let base_commit = git.resolve(&opts.base)?;
    let head_commit = git.resolve(HEAD_REF)?;
    info!(base = %opts.base, %base_commit, %head_commit, "comparing");

    let files = git.changed_files(base_commit, head_commit, opts.detect_renames)?;
    let hunks = files
        .iter()
        .flat_map(|f| parse_hunks(&f.path, &f.diff_text))
        .collect();

    let snapshots = git.snapshots(base_commit, head_commit)?;
    let symbols = SnapshotBuilder::new(&snapshots, &opts.extensions).build(&files);
    let changes = diff_symbols(&symbols).into_changes();

    let meta = DiffMetadata {
        base_ref: opts.base.clone(),
        base_commit: base_commit.to_string(),
        head_ref: HEAD_REF.to_owned(),
        head_commit: head_commit.to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        repo: git.root().to_string_lossy().into_owned(),
    };

    Ok(RunRecord { meta, files, hunks, symbols, changes })
}

/// Collects a run, replaces the store contents at `db_path` with it, and
/// writes the JSON summary when `summary_path` is given.
pub async fn execute(
    opts: &RunOptions,
    db_path: &Path,
    summary_path: Option<&Path>,
) -> Result<RunRecord> {
    let run = collect_run(opts)?;

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let store = Store::open(&db_path.to_string_lossy()).await?;
    store.commit_run(&run).await?;

    if let Some(path) = summary_path {
        Summary::from_run(&run).write_to(path)?;
        info!(path = %path.display(), "summary written");
    }

    info!(
        files = run.files.len(),
        added = run.count_changes(ChangeType::Added),
        removed = run.count_changes(ChangeType::Removed),
        "run complete"
    );
    Ok(run)
}
