//! JSON summary of a committed run, for report renderers.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::types::{ChangeType, DiffMetadata, RunRecord, SymbolKey};

#[derive(Debug, Serialize)]
pub struct SummaryCounts {
    pub files: usize,
    pub symbols_added: usize,
    pub symbols_removed: usize,
}

#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub meta: &'a DiffMetadata,
    pub counts: SummaryCounts,
    pub symbols_added: Vec<&'a SymbolKey>,
    pub symbols_removed: Vec<&'a SymbolKey>,
}

impl<'a> Summary<'a> {
    pub fn from_run(run: &'a RunRecord) -> Self {
        let keys = |change_type: ChangeType| -> Vec<&'a SymbolKey> {
            run.changes
                .iter()
                .filter(|c| c.change_type == change_type)
                .map(|c| &c.key)
                .collect()
        };
        let symbols_added = keys(ChangeType::Added);
        let symbols_removed = keys(ChangeType::Removed);
        Summary {
            meta: &run.meta,
            counts: SummaryCounts {
                files: run.files.len(),
                symbols_added: symbols_added.len(),
                symbols_removed: symbols_removed.len(),
            },
            symbols_added,
            symbols_removed,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the pretty-printed document to `path`, creating parent
    /// directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SymbolChange, SymbolKind};

    #[test]
    fn json_shape_matches_report_contract() {
        let key = SymbolKey {
            path: "api/server.go".to_owned(),
            package: "api".to_owned(),
            kind: SymbolKind::Method,
            receiver: "Server".to_owned(),
            name: "Start".to_owned(),
        };
        let run = RunRecord {
            meta: DiffMetadata {
                base_ref: "origin/main".to_owned(),
                base_commit: "abc".to_owned(),
                head_ref: "HEAD".to_owned(),
                head_commit: "def".to_owned(),
                generated_at: "2026-01-01T00:00:00.000000Z".to_owned(),
                repo: "/src/repo".to_owned(),
            },
            files: Vec::new(),
            hunks: Vec::new(),
            symbols: Vec::new(),
            changes: vec![SymbolChange { change_type: ChangeType::Removed, key }],
        };

        let value: serde_json::Value =
            serde_json::from_str(&Summary::from_run(&run).to_json().unwrap()).unwrap();
        assert_eq!(value["meta"]["base_ref"], "origin/main");
        assert_eq!(value["counts"]["files"], 0);
        assert_eq!(value["counts"]["symbols_added"], 0);
        assert_eq!(value["counts"]["symbols_removed"], 1);
        assert_eq!(value["symbols_added"], serde_json::json!([]));
        assert_eq!(
            value["symbols_removed"][0],
            serde_json::json!({
                "path": "api/server.go",
                "package": "api",
                "kind": "method",
                "receiver": "Server",
                "name": "Start",
            })
        );
    }
}
