use std::fmt;

use serde::Serialize;

/// Which side of the comparison a snapshot or symbol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Version {
    Base,
    Head,
}

impl Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Version::Base => "base",
            Version::Head => "head",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "base" => Some(Version::Base),
            "head" => Some(Version::Head),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file change status between the base and head snapshots.
///
/// Git delta kinds with no counterpart here (copied, type change) are
/// recorded as `Modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Deleted => "deleted",
            ChangeStatus::Renamed => "renamed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "added" => Some(ChangeStatus::Added),
            "modified" => Some(ChangeStatus::Modified),
            "deleted" => Some(ChangeStatus::Deleted),
            "renamed" => Some(ChangeStatus::Renamed),
            _ => None,
        }
    }

    /// Whether the file has content at the base version.
    pub fn has_base(self) -> bool {
        !matches!(self, ChangeStatus::Added)
    }

    /// Whether the file has content at the head version.
    pub fn has_head(self) -> bool {
        !matches!(self, ChangeStatus::Deleted)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration kind of an extracted symbol.
///
/// Variants are declared in alphabetical order so the derived `Ord` agrees
/// with the ordering of the stored text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Const,
    Func,
    Method,
    Type,
    Var,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Const => "const",
            SymbolKind::Func => "func",
            SymbolKind::Method => "method",
            SymbolKind::Type => "type",
            SymbolKind::Var => "var",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "const" => Some(SymbolKind::Const),
            "func" => Some(SymbolKind::Func),
            "method" => Some(SymbolKind::Method),
            "type" => Some(SymbolKind::Type),
            "var" => Some(SymbolKind::Var),
            _ => None,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a computed symbol change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Added,
    Removed,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "added" => Some(ChangeType::Added),
            "removed" => Some(ChangeType::Removed),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-level metadata describing the base/head comparison.
///
/// Created once per run and persisted as key/value rows in `diff_meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffMetadata {
    pub base_ref: String,
    pub base_commit: String,
    pub head_ref: String,
    pub head_commit: String,
    pub generated_at: String, // RFC 3339, UTC
    pub repo: String,
}

impl DiffMetadata {
    /// Key/value pairs in the order they are written to the store.
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("base_ref", &self.base_ref),
            ("base_commit", &self.base_commit),
            ("head_ref", &self.head_ref),
            ("head_commit", &self.head_commit),
            ("generated_at", &self.generated_at),
            ("repo", &self.repo),
        ]
    }
}

/// One changed path in the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiffRecord {
    pub path: String,
    /// Path at the base version when the file was renamed.
    pub old_path: Option<String>,
    pub status: ChangeStatus,
    pub additions: u32,
    pub deletions: u32,
    pub diff_text: String,
}

impl FileDiffRecord {
    /// Path the file had at `version`.
    pub fn path_at(&self, version: Version) -> &str {
        match (version, &self.old_path) {
            (Version::Base, Some(old)) => old,
            _ => &self.path,
        }
    }
}

/// A diff hunk with its header ranges and raw body text.
///
/// Identified by `(path, hunk_index)`. Range fields are all zero when the
/// header could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub path: String,
    pub hunk_index: u32,
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub header: String,
    pub body: String, // header line first, then every line up to the next header
}

/// A named declaration found in one snapshot of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub version: Version,
    pub path: String,
    pub package: String,
    pub name: String,
    pub kind: SymbolKind,
    pub receiver: String,
    pub line: u32,
    pub signature: String,
}

impl Symbol {
    pub fn key(&self) -> SymbolKey {
        SymbolKey {
            path: self.path.clone(),
            package: self.package.clone(),
            kind: self.kind,
            receiver: self.receiver.clone(),
            name: self.name.clone(),
        }
    }
}

/// Structural identity of a symbol: line and signature are deliberately
/// not part of it.
///
/// Field order defines the sort order of differ output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolKey {
    pub path: String,
    pub package: String,
    pub kind: SymbolKind,
    pub receiver: String,
    pub name: String,
}

/// An added or removed symbol identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolChange {
    pub change_type: ChangeType,
    pub key: SymbolKey,
}

/// Everything one run writes to the store.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub meta: DiffMetadata,
    pub files: Vec<FileDiffRecord>,
    pub hunks: Vec<Hunk>,
    pub symbols: Vec<Symbol>,
    pub changes: Vec<SymbolChange>,
}

impl RunRecord {
    pub fn count_changes(&self, change_type: ChangeType) -> usize {
        self.changes.iter().filter(|c| c.change_type == change_type).count()
    }
}
