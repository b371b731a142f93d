use std::collections::BTreeMap;
use std::time::Duration;

use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::RUN_TABLES;
use crate::types::{
    ChangeStatus, ChangeType, FileDiffRecord, Hunk, RunRecord, Symbol, SymbolChange, SymbolKey,
    SymbolKind, Version,
};

/// Row counts of the five run tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub meta: i64,
    pub files: i64,
    pub hunks: i64,
    pub symbols: i64,
    pub changes: i64,
}

/// Handle to the run database.
///
/// Every stage that touches the store receives this handle; there is no
/// process-wide connection.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (or creates) the SQLite database at `path`, configures WAL mode,
    /// and applies schema migrations via the `schema_version` table.
    ///
    /// `busy_timeout` is set via the `Connection` method rather than a PRAGMA
    /// string so the setting takes effect regardless of pragma caching.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if the file cannot be opened, WAL
    /// configuration fails, or schema DDL fails.
    pub async fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).await?;

        conn.call(|db| -> rusqlite::Result<()> {
            db.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA foreign_keys=ON;",
            )?;
            db.busy_timeout(Duration::from_secs(5))?;
            Ok(())
        })
        .await?;

        // Fold any WAL left behind by an earlier run into the main file.
        conn.call(|db| -> rusqlite::Result<()> {
            db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        })
        .await?;

        conn.call(|db| -> rusqlite::Result<()> { crate::schema::migrate(db) })
            .await?;

        debug!(path, "store opened");
        Ok(Self { conn })
    }

    /// Replaces the store contents with `run`.
    ///
    /// All five tables are cleared and refilled inside one `BEGIN IMMEDIATE`
    /// transaction. If any statement fails the transaction is dropped
    /// uncommitted, so the previous run's rows stay visible and none of the
    /// new rows do.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if any delete or insert fails.
    pub async fn commit_run(&self, run: &RunRecord) -> Result<()> {
        let run = run.clone();
        let counts = self
            .conn
            .call(move |db| -> rusqlite::Result<TableCounts> {
                let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                for table in RUN_TABLES {
                    tx.execute(&format!("DELETE FROM {table}"), [])?;
                }
                insert_run(&tx, &run)?;
                let counts = count_tables(&tx)?;
                tx.commit()?;
                Ok(counts)
            })
            .await?;

        info!(
            files = counts.files,
            hunks = counts.hunks,
            symbols = counts.symbols,
            changes = counts.changes,
            "run committed"
        );
        Ok(())
    }

    /// Loads the `diff_meta` key/value rows.
    pub async fn load_metadata(&self) -> Result<BTreeMap<String, String>> {
        let rows = self
            .conn
            .call(|db| -> rusqlite::Result<BTreeMap<String, String>> {
                let mut stmt = db.prepare("SELECT key, value FROM diff_meta")?;
                let rows = stmt
                    .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
                    .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows)
    }

    /// Looks up one changed file by its (head) path.
    pub async fn file_diff(&self, path: &str) -> Result<Option<FileDiffRecord>> {
        let path = path.to_owned();
        let file = self
            .conn
            .call(move |db| -> rusqlite::Result<Option<FileDiffRecord>> {
                db.query_row(
                    "SELECT path, old_path, status, additions, deletions, diff_text
                     FROM diff_files WHERE path = ?1",
                    rusqlite::params![&path],
                    file_from_row,
                )
                .optional()
            })
            .await?;
        Ok(file)
    }

    /// Hunks of one file in hunk order.
    pub async fn hunks_for_path(&self, path: &str) -> Result<Vec<Hunk>> {
        let path = path.to_owned();
        let hunks = self
            .conn
            .call(move |db| -> rusqlite::Result<Vec<Hunk>> {
                let mut stmt = db.prepare(
                    "SELECT path, hunk_index, old_start, old_lines, new_start, new_lines,
                            header, hunk_text
                     FROM diff_hunks WHERE path = ?1 ORDER BY hunk_index",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![&path], |r| {
                        Ok(Hunk {
                            path: r.get(0)?,
                            hunk_index: r.get(1)?,
                            old_start: r.get(2)?,
                            old_lines: r.get(3)?,
                            new_start: r.get(4)?,
                            new_lines: r.get(5)?,
                            header: r.get(6)?,
                            body: r.get(7)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;
        Ok(hunks)
    }

    /// All symbols of one version, ordered by path then line.
    pub async fn symbols_by_version(&self, version: Version) -> Result<Vec<Symbol>> {
        self.query_symbols("version = ?1", version.as_str().to_owned()).await
    }

    /// All symbols (both versions) recorded under `path`.
    pub async fn symbols_for_path(&self, path: &str) -> Result<Vec<Symbol>> {
        self.query_symbols("path = ?1", path.to_owned()).await
    }

    async fn query_symbols(&self, filter: &'static str, value: String) -> Result<Vec<Symbol>> {
        let symbols = self
            .conn
            .call(move |db| -> rusqlite::Result<Vec<Symbol>> {
                let sql = format!(
                    "SELECT version, path, package, name, kind, receiver, line, signature
                     FROM symbols WHERE {filter} ORDER BY path, version, line, name"
                );
                let mut stmt = db.prepare(&sql)?;
                let rows = stmt
                    .query_map(rusqlite::params![&value], symbol_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;
        Ok(symbols)
    }

    /// Added or removed identities, in identity order.
    pub async fn changes_by_type(&self, change_type: ChangeType) -> Result<Vec<SymbolKey>> {
        let keys = self
            .conn
            .call(move |db| -> rusqlite::Result<Vec<SymbolKey>> {
                let mut stmt = db.prepare(
                    "SELECT path, package, kind, receiver, name
                     FROM symbol_changes WHERE change_type = ?1",
                )?;
                let mut rows = stmt
                    .query_map(rusqlite::params![change_type.as_str()], |r| {
                        Ok(SymbolKey {
                            path: r.get(0)?,
                            package: r.get(1)?,
                            kind: parse_column(r, 2, SymbolKind::parse)?,
                            receiver: r.get(3)?,
                            name: r.get(4)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows.sort();
                Ok(rows)
            })
            .await?;
        Ok(keys)
    }

    pub async fn table_counts(&self) -> Result<TableCounts> {
        let counts = self
            .conn
            .call(|db| -> rusqlite::Result<TableCounts> { count_tables(db) })
            .await?;
        Ok(counts)
    }
}

fn insert_run(db: &rusqlite::Connection, run: &RunRecord) -> rusqlite::Result<()> {
    {
        let mut stmt = db.prepare("INSERT INTO diff_meta (key, value) VALUES (?1, ?2)")?;
        for (key, value) in run.meta.entries() {
            stmt.execute(rusqlite::params![key, value])?;
        }
    }
    {
        let mut stmt = db.prepare(
            "INSERT INTO diff_files (path, old_path, status, additions, deletions, diff_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for f in &run.files {
            stmt.execute(rusqlite::params![
                &f.path,
                &f.old_path,
                f.status.as_str(),
                f.additions,
                f.deletions,
                &f.diff_text,
            ])?;
        }
    }
    {
        let mut stmt = db.prepare(
            "INSERT INTO diff_hunks
             (path, hunk_index, old_start, old_lines, new_start, new_lines, header, hunk_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for h in &run.hunks {
            stmt.execute(rusqlite::params![
                &h.path,
                h.hunk_index,
                h.old_start,
                h.old_lines,
                h.new_start,
                h.new_lines,
                &h.header,
                &h.body,
            ])?;
        }
    }
    {
        let mut stmt = db.prepare(
            "INSERT INTO symbols
             (version, path, package, name, kind, receiver, line, signature)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for s in &run.symbols {
            stmt.execute(rusqlite::params![
                s.version.as_str(),
                &s.path,
                &s.package,
                &s.name,
                s.kind.as_str(),
                &s.receiver,
                s.line,
                &s.signature,
            ])?;
        }
    }
    {
        let mut stmt = db.prepare(
            "INSERT INTO symbol_changes (change_type, path, package, kind, receiver, name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for SymbolChange { change_type, key } in &run.changes {
            stmt.execute(rusqlite::params![
                change_type.as_str(),
                &key.path,
                &key.package,
                key.kind.as_str(),
                &key.receiver,
                &key.name,
            ])?;
        }
    }
    Ok(())
}

fn count_tables(db: &rusqlite::Connection) -> rusqlite::Result<TableCounts> {
    let count = |table: &str| -> rusqlite::Result<i64> {
        db.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
    };
    Ok(TableCounts {
        meta: count("diff_meta")?,
        files: count("diff_files")?,
        hunks: count("diff_hunks")?,
        symbols: count("symbols")?,
        changes: count("symbol_changes")?,
    })
}

/// Reads a text column and maps it through `parse`, reporting unknown
/// values as a conversion failure.
fn parse_column<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    parse(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value {text:?}").into(),
        )
    })
}

fn file_from_row(r: &Row<'_>) -> rusqlite::Result<FileDiffRecord> {
    Ok(FileDiffRecord {
        path: r.get(0)?,
        old_path: r.get(1)?,
        status: parse_column(r, 2, ChangeStatus::parse)?,
        additions: r.get(3)?,
        deletions: r.get(4)?,
        diff_text: r.get(5)?,
    })
}

fn symbol_from_row(r: &Row<'_>) -> rusqlite::Result<Symbol> {
    Ok(Symbol {
        version: parse_column(r, 0, Version::parse)?,
        path: r.get(1)?,
        package: r.get(2)?,
        name: r.get(3)?,
        kind: parse_column(r, 4, SymbolKind::parse)?,
        receiver: r.get(5)?,
        line: r.get(6)?,
        signature: r.get(7)?,
    })
}
