/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 schema.
///
/// - `drafts`: keyed slots holding unsaved editor text. The UI uses one slot,
///   `current`; a save overwrites it.
/// - `history`: past submissions, newest first by `submitted_at`, trimmed to a
///   fixed count by `db::record_submission`.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS drafts (
        slot      TEXT    PRIMARY KEY,
        body      TEXT    NOT NULL,
        language  TEXT,
        saved_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS history (
        id            TEXT    PRIMARY KEY,
        code          TEXT    NOT NULL,
        language      TEXT,
        summary       TEXT,
        submitted_at  INTEGER NOT NULL,
        seq           INTEGER NOT NULL
    ) STRICT;

    CREATE INDEX IF NOT EXISTS history_recent ON history (submitted_at DESC, seq DESC);
";

/// Runs forward-only schema migration to the latest version.
///
/// Idempotent: safe to call on every startup.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
