//! Builds per-version symbol tables for the changed files of a run.

use std::borrow::Cow;
use std::path::Path;

use tracing::debug;

use crate::extract::extract;
use crate::types::{FileDiffRecord, Symbol, Version};

/// Supplies file content at either side of the comparison.
///
/// `None` means the path does not exist at that version, which is an
/// expected outcome for added and deleted files.
pub trait SnapshotSource {
    fn read_blob(&self, version: Version, path: &str) -> Option<Vec<u8>>;
}

/// Decodes blob bytes as UTF-8, falling back to Windows-1252 so that a
/// file with stray non-UTF-8 bytes still yields text.
pub fn decode_best_effort(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded
        }
    }
}

/// Extracts symbols for changed source files from a [`SnapshotSource`].
pub struct SnapshotBuilder<'a, S: SnapshotSource> {
    source: &'a S,
    extensions: Vec<String>,
}

impl<'a, S: SnapshotSource> SnapshotBuilder<'a, S> {
    /// `extensions` are matched against the path extension without the dot.
    pub fn new(source: &'a S, extensions: &[String]) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self { source, extensions }
    }

    pub fn is_source_path(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }

    /// Base symbols for everything but added files, head symbols for
    /// everything but deleted files.
    ///
    /// The extension filter applies to the path each side is read from, so
    /// a rename that changes the extension contributes only the side that
    /// is still a source file.
    pub fn build(&self, files: &[FileDiffRecord]) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        for file in files {
            for version in [Version::Base, Version::Head] {
                let present = match version {
                    Version::Base => file.status.has_base(),
                    Version::Head => file.status.has_head(),
                };
                if present && self.is_source_path(file.path_at(version)) {
                    symbols.extend(self.symbols_at(file, version));
                }
            }
        }
        symbols
    }

    fn symbols_at(&self, file: &FileDiffRecord, version: Version) -> Vec<Symbol> {
        let path = file.path_at(version);
        let Some(bytes) = self.source.read_blob(version, path) else {
            debug!(path, %version, "no blob at this version, empty symbol set");
            return Vec::new();
        };
        let text = decode_best_effort(&bytes);
        if matches!(text, Cow::Owned(_)) {
            debug!(path, %version, "content is not valid UTF-8, decoded lossily");
        }

        let extraction = extract(&text);
        debug!(path, %version, count = extraction.declarations.len(), "extracted symbols");
        extraction
            .declarations
            .into_iter()
            .map(|d| Symbol {
                version,
                path: path.to_owned(),
                package: extraction.package.clone(),
                name: d.decl.name().to_owned(),
                kind: d.decl.kind(),
                receiver: d.decl.receiver().to_owned(),
                line: d.line,
                signature: d.decl.signature(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeStatus, SymbolKind};
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapSource(HashMap<(Version, String), Vec<u8>>);

    impl MapSource {
        fn with(mut self, version: Version, path: &str, content: &[u8]) -> Self {
            self.0.insert((version, path.to_owned()), content.to_vec());
            self
        }
    }

    impl SnapshotSource for MapSource {
        fn read_blob(&self, version: Version, path: &str) -> Option<Vec<u8>> {
            self.0.get(&(version, path.to_owned())).cloned()
        }
    }

    fn record(path: &str, status: ChangeStatus) -> FileDiffRecord {
        FileDiffRecord {
            path: path.to_owned(),
            old_path: None,
            status,
            additions: 0,
            deletions: 0,
            diff_text: String::new(),
        }
    }

    const SRC: &[u8] = b"package p\n\nfunc Exported() {}\n";

    #[test]
    fn added_file_has_only_head_symbols() {
        let source = MapSource::default()
            .with(Version::Base, "a.go", SRC)
            .with(Version::Head, "a.go", SRC);
        let symbols = SnapshotBuilder::new(&source, &["go".to_owned()])
            .build(&[record("a.go", ChangeStatus::Added)]);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].version, Version::Head);
        assert_eq!(symbols[0].package, "p");
        assert_eq!(symbols[0].line, 3);
        assert_eq!(symbols[0].signature, "func Exported");
    }

    #[test]
    fn deleted_file_has_only_base_symbols() {
        let source = MapSource::default().with(Version::Base, "a.go", SRC);
        let symbols = SnapshotBuilder::new(&source, &["go".to_owned()])
            .build(&[record("a.go", ChangeStatus::Deleted)]);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].version, Version::Base);
    }

    #[test]
    fn modified_file_has_both_and_missing_blob_is_empty() {
        let source = MapSource::default().with(Version::Head, "a.go", SRC);
        let symbols = SnapshotBuilder::new(&source, &["go".to_owned()])
            .build(&[record("a.go", ChangeStatus::Modified)]);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].version, Version::Head);
    }

    #[test]
    fn renamed_file_reads_base_from_old_path() {
        let source = MapSource::default()
            .with(Version::Base, "old.go", SRC)
            .with(Version::Head, "new.go", SRC);
        let mut rec = record("new.go", ChangeStatus::Renamed);
        rec.old_path = Some("old.go".to_owned());
        let symbols = SnapshotBuilder::new(&source, &["go".to_owned()]).build(&[rec]);
        let paths: Vec<(Version, &str)> =
            symbols.iter().map(|s| (s.version, s.path.as_str())).collect();
        assert_eq!(paths, vec![(Version::Base, "old.go"), (Version::Head, "new.go")]);
    }

    #[test]
    fn rename_across_extensions_keeps_only_the_source_side() {
        let source = MapSource::default()
            .with(Version::Base, "api.go", SRC)
            .with(Version::Head, "api.txt", SRC)
            .with(Version::Base, "notes.txt", SRC)
            .with(Version::Head, "x.go", SRC);
        let mut retired = record("api.txt", ChangeStatus::Renamed);
        retired.old_path = Some("api.go".to_owned());
        let mut promoted = record("x.go", ChangeStatus::Renamed);
        promoted.old_path = Some("notes.txt".to_owned());

        let symbols =
            SnapshotBuilder::new(&source, &["go".to_owned()]).build(&[retired, promoted]);
        let paths: Vec<(Version, &str)> =
            symbols.iter().map(|s| (s.version, s.path.as_str())).collect();
        assert_eq!(paths, vec![(Version::Base, "api.go"), (Version::Head, "x.go")]);
    }

    #[test]
    fn non_source_files_are_skipped() {
        let source = MapSource::default().with(Version::Head, "README.md", b"type Foo int\n");
        let builder = SnapshotBuilder::new(&source, &[".GO".to_owned()]);
        assert!(builder.is_source_path("x/y.go"));
        assert!(!builder.is_source_path("Makefile"));
        assert!(builder.build(&[record("README.md", ChangeStatus::Added)]).is_empty());
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let source =
            MapSource::default().with(Version::Head, "a.go", b"package p\n// caf\xe9\ntype Caf\xe9 int\ntype Ok int\n");
        let symbols = SnapshotBuilder::new(&source, &["go".to_owned()])
            .build(&[record("a.go", ChangeStatus::Added)]);
        let names: Vec<(&str, SymbolKind)> =
            symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        // `Caf` followed by a non-ASCII letter is not a complete identifier.
        assert_eq!(names, vec![("Ok", SymbolKind::Type)]);
    }
}
