//! git2-backed repository access.
//!
//! Every git2 failure here is fatal for the run and surfaces as
//! [`Error::ExternalTool`]; only a path missing from one side of the
//! comparison is tolerated, as an absent blob.

use std::path::{Path, PathBuf};

use apidelta_core::types::{ChangeStatus, FileDiffRecord, Version};
use apidelta_core::{Error, Result, SnapshotSource};
use git2::{Delta, Diff, DiffFindOptions, DiffOptions, Oid, Patch, Repository, Tree};
use tracing::debug;

fn git_error(op: &'static str) -> impl FnOnce(git2::Error) -> Error {
    move |e| Error::external_tool(op, e.message())
}

/// An opened repository.
pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Opens the repository containing `path`, searching parent
    /// directories like `git -C <path>` does.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).map_err(git_error("open"))?;
        Ok(Self { repo })
    }

    /// Work tree root, or the git directory of a bare repository, without
    /// the trailing separator git2 reports.
    pub fn root(&self) -> PathBuf {
        let dir = self.repo.workdir().unwrap_or_else(|| self.repo.path());
        dir.components().collect()
    }

    /// Resolves any revision spec (`origin/main`, `HEAD~2`, a hash) to the
    /// commit it names.
    pub fn resolve(&self, spec: &str) -> Result<Oid> {
        let obj = self.repo.revparse_single(spec).map_err(git_error("rev-parse"))?;
        let commit = obj.peel_to_commit().map_err(git_error("rev-parse"))?;
        Ok(commit.id())
    }

    fn tree_of(&self, commit: Oid) -> Result<Tree<'_>> {
        self.repo
            .find_commit(commit)
            .and_then(|c| c.tree())
            .map_err(git_error("read tree"))
    }

    /// Lists files changed on `head` since it forked from `base`.
    ///
    /// This is the three-dot comparison: the old side is the merge base of
    /// the two commits, so changes made only on `base` are not reported.
    /// Each record carries the file's own patch text and its added/removed
    /// line counts (zero for binary files). Records are sorted by path.
    pub fn changed_files(
        &self,
        base: Oid,
        head: Oid,
        detect_renames: bool,
    ) -> Result<Vec<FileDiffRecord>> {
        let fork_point = self.repo.merge_base(base, head).map_err(git_error("merge-base"))?;
        let old_tree = self.tree_of(fork_point)?;
        let new_tree = self.tree_of(head)?;

        // Without this a file turned symlink splits into a delete and an add
        // of the same path.
        let mut opts = DiffOptions::new();
        opts.include_typechange(true);
        let mut diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut opts))
            .map_err(git_error("diff"))?;
        if detect_renames {
            let mut find = DiffFindOptions::new();
            find.renames(true);
            diff.find_similar(Some(&mut find)).map_err(git_error("diff"))?;
        }

        let mut files = extract_files(&diff)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = files.len(), %fork_point, "collected changed files");
        Ok(files)
    }

    /// Content source for the `base`/`head` commit pair.
    pub fn snapshots(&self, base: Oid, head: Oid) -> Result<CommitSnapshots<'_>> {
        Ok(CommitSnapshots {
            repo: &self.repo,
            base: self.tree_of(base)?,
            head: self.tree_of(head)?,
        })
    }
}

/// Converts each delta of `diff` into an owned record with its patch text
/// and line statistics.
fn extract_files(diff: &Diff<'_>) -> Result<Vec<FileDiffRecord>> {
    let mut files = Vec::with_capacity(diff.deltas().len());

    for (idx, delta) in diff.deltas().enumerate() {
        let path_of = |file: git2::DiffFile<'_>| {
            file.path().map(|p| p.to_string_lossy().into_owned())
        };
        let new_path = path_of(delta.new_file());
        let old_path = path_of(delta.old_file());
        let Some(path) = new_path.clone().or_else(|| old_path.clone()) else {
            continue;
        };

        let status = match delta.status() {
            Delta::Added => ChangeStatus::Added,
            Delta::Deleted => ChangeStatus::Deleted,
            Delta::Renamed => ChangeStatus::Renamed,
            _ => ChangeStatus::Modified,
        };
        let old_path = if status == ChangeStatus::Renamed { old_path } else { None };

        let (diff_text, additions, deletions) = match Patch::from_diff(diff, idx)
            .map_err(git_error("diff"))?
        {
            Some(mut patch) => {
                let buf = patch.to_buf().map_err(git_error("diff"))?;
                let (_, additions, deletions) = patch.line_stats().map_err(git_error("diff"))?;
                (
                    String::from_utf8_lossy(&buf).into_owned(),
                    additions as u32,
                    deletions as u32,
                )
            }
            None => (String::new(), 0, 0),
        };

        files.push(FileDiffRecord { path, old_path, status, additions, deletions, diff_text });
    }

    Ok(files)
}

/// Trees of the two commits being compared.
pub struct CommitSnapshots<'r> {
    repo: &'r Repository,
    base: Tree<'r>,
    head: Tree<'r>,
}

impl SnapshotSource for CommitSnapshots<'_> {
    fn read_blob(&self, version: Version, path: &str) -> Option<Vec<u8>> {
        let tree = match version {
            Version::Base => &self.base,
            Version::Head => &self.head,
        };
        let entry = tree.get_path(Path::new(path)).ok()?;
        let blob = entry.to_object(self.repo).ok()?.peel_to_blob().ok()?;
        Some(blob.content().to_vec())
    }
}
