/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// Names of the run tables, in the order their rows are cleared.
///
/// `diff_hunks` references `diff_files`, so it goes first.
pub const RUN_TABLES: [&str; 5] =
    ["symbol_changes", "symbols", "diff_hunks", "diff_files", "diff_meta"];

/// DDL for the full v1 schema.
///
/// Contains five tables:
/// - `diff_meta`: run metadata as key/value rows.
/// - `diff_files`: one row per changed path with status, line counts and patch text.
/// - `diff_hunks`: hunks keyed by `(path, hunk_index)`.
/// - `symbols`: extracted declarations tagged `base` or `head`.
/// - `symbol_changes`: identities added or removed between the two versions.
///
/// Any same-named tables left by an unversioned database are dropped first;
/// their contents are rebuilt by the next run anyway.
pub const SCHEMA_V1_SQL: &str = "
    DROP TABLE IF EXISTS symbol_changes;
    DROP TABLE IF EXISTS symbols;
    DROP TABLE IF EXISTS diff_hunks;
    DROP TABLE IF EXISTS diff_files;
    DROP TABLE IF EXISTS diff_meta;

    CREATE TABLE diff_meta (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    ) STRICT;

    CREATE TABLE diff_files (
        path      TEXT    PRIMARY KEY,
        old_path  TEXT,
        status    TEXT    NOT NULL
                          CHECK(status IN ('added', 'modified', 'deleted', 'renamed')),
        additions INTEGER NOT NULL DEFAULT 0,
        deletions INTEGER NOT NULL DEFAULT 0,
        diff_text TEXT    NOT NULL
    ) STRICT;

    CREATE TABLE diff_hunks (
        path       TEXT    NOT NULL REFERENCES diff_files(path) ON DELETE CASCADE,
        hunk_index INTEGER NOT NULL,
        old_start  INTEGER NOT NULL,
        old_lines  INTEGER NOT NULL,
        new_start  INTEGER NOT NULL,
        new_lines  INTEGER NOT NULL,
        header     TEXT    NOT NULL,
        hunk_text  TEXT    NOT NULL,
        PRIMARY KEY (path, hunk_index)
    ) STRICT;

    CREATE TABLE symbols (
        version   TEXT    NOT NULL CHECK(version IN ('base', 'head')),
        path      TEXT    NOT NULL,
        package   TEXT    NOT NULL,
        name      TEXT    NOT NULL,
        kind      TEXT    NOT NULL
                          CHECK(kind IN ('type', 'func', 'method', 'const', 'var')),
        receiver  TEXT    NOT NULL,
        line      INTEGER NOT NULL,
        signature TEXT    NOT NULL
    ) STRICT;
    CREATE INDEX idx_symbols_version ON symbols(version);
    CREATE INDEX idx_symbols_path ON symbols(path);

    CREATE TABLE symbol_changes (
        change_type TEXT NOT NULL CHECK(change_type IN ('added', 'removed')),
        path        TEXT NOT NULL,
        package     TEXT NOT NULL,
        kind        TEXT NOT NULL,
        receiver    TEXT NOT NULL,
        name        TEXT NOT NULL
    ) STRICT;
    CREATE INDEX idx_symbol_changes_type ON symbol_changes(change_type);
    CREATE INDEX idx_symbol_changes_path ON symbol_changes(path);
";

/// Runs forward-only schema migration to migrate the DB to the latest version.
///
/// Idempotent: safe to call on every open.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 =
        db.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
