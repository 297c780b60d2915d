use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::error::StorageError;
use crate::language::Language;
use crate::types::{CodeDraft, HistoryEntry};

/// Slot name of the single editor draft.
pub const DRAFT_SLOT: &str = "current";

/// Number of past submissions kept by default.
pub const HISTORY_CAP: usize = 10;

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// This function is the single entry point for all database connections.
/// `busy_timeout` is set through the `Connection` method rather than a PRAGMA
/// string so it takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `StorageError` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, StorageError> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    // Checkpoint any leftover WAL from a previous run.
    conn.call(|db| {
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}

/// Returns the current Unix timestamp in seconds.
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Loads the draft in `slot`, if one has been saved.
pub async fn load_draft(conn: &Connection, slot: &str) -> Result<Option<CodeDraft>, StorageError> {
    let slot = slot.to_owned();

    let draft = conn
        .call(move |db| {
            let row = db
                .query_row(
                    "SELECT body, language, saved_at FROM drafts WHERE slot = ?1",
                    rusqlite::params![&slot],
                    |r| {
                        let body: String = r.get(0)?;
                        let language: Option<String> = r.get(1)?;
                        let saved_at: i64 = r.get(2)?;
                        Ok((body, language, saved_at))
                    },
                )
                .optional()?;
            Ok::<_, rusqlite::Error>(row)
        })
        .await?;

    Ok(draft.map(|(text, language, saved_at)| CodeDraft {
        text,
        detected_language: language.as_deref().and_then(Language::from_tag),
        last_saved_at: Some(saved_at),
    }))
}

/// Overwrites the draft in `slot` and returns the timestamp written.
pub async fn store_draft(
    conn: &Connection,
    slot: &str,
    text: &str,
    language: Option<Language>,
) -> Result<i64, StorageError> {
    let slot = slot.to_owned();
    let text = text.to_owned();
    let language = language.map(|l| l.as_str().to_owned());

    let saved_at = conn
        .call(move |db| {
            let now = now_secs();
            db.execute(
                "INSERT INTO drafts (slot, body, language, saved_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(slot)
                 DO UPDATE SET body = excluded.body,
                               language = excluded.language,
                               saved_at = excluded.saved_at",
                rusqlite::params![&slot, &text, &language, now],
            )?;
            Ok::<_, rusqlite::Error>(now)
        })
        .await?;
    Ok(saved_at)
}

fn history_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: r.get(0)?,
        code: r.get(1)?,
        language: r.get(2)?,
        summary: r.get(3)?,
        submitted_at: r.get(4)?,
    })
}

/// Records a submission at the head of the history and trims it to `cap` entries.
///
/// Submitting the same code as the newest entry again only bumps that entry's
/// timestamp (and language), so retries do not flood the list.
///
/// # Errors
///
/// Returns `StorageError` if the `BEGIN IMMEDIATE` transaction fails.
pub async fn record_submission(
    conn: &Connection,
    code: &str,
    language: Option<&str>,
    cap: usize,
) -> Result<HistoryEntry, StorageError> {
    let code = code.to_owned();
    let language = language.map(str::to_owned);
    let cap = cap.max(1) as i64;

    let entry = conn
        .call(move |db| {
            let now = now_secs();
            let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

            let newest: Option<HistoryEntry> = tx
                .query_row(
                    "SELECT id, code, language, summary, submitted_at FROM history
                     ORDER BY submitted_at DESC, seq DESC LIMIT 1",
                    [],
                    history_row,
                )
                .optional()?;
            let seq: i64 =
                tx.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM history", [], |r| r.get(0))?;

            let entry = match newest {
                Some(mut newest) if newest.code == code => {
                    tx.execute(
                        "UPDATE history SET submitted_at = ?1, language = ?2, seq = ?3 WHERE id = ?4",
                        rusqlite::params![now, &language, seq, &newest.id],
                    )?;
                    newest.submitted_at = now;
                    newest.language = language;
                    newest
                }
                _ => {
                    let id = uuid::Uuid::new_v4().to_string();
                    tx.execute(
                        "INSERT INTO history (id, code, language, summary, submitted_at, seq)
                         VALUES (?1, ?2, ?3, NULL, ?4, ?5)",
                        rusqlite::params![&id, &code, &language, now, seq],
                    )?;
                    HistoryEntry {
                        id,
                        code,
                        language,
                        summary: None,
                        submitted_at: now,
                    }
                }
            };

            tx.execute(
                "DELETE FROM history WHERE id NOT IN (
                     SELECT id FROM history ORDER BY submitted_at DESC, seq DESC LIMIT ?1
                 )",
                rusqlite::params![cap],
            )?;
            tx.commit()?;
            Ok::<_, rusqlite::Error>(entry)
        })
        .await?;
    Ok(entry)
}

/// Stores the analysis summary (and reported language) on a history entry.
pub async fn attach_summary(
    conn: &Connection,
    id: &str,
    summary: &str,
    language: Option<&str>,
) -> Result<(), StorageError> {
    let id = id.to_owned();
    let summary = summary.to_owned();
    let language = language.map(str::to_owned);

    conn.call(move |db| {
        db.execute(
            "UPDATE history SET summary = ?1, language = COALESCE(?2, language) WHERE id = ?3",
            rusqlite::params![&summary, &language, &id],
        )?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;
    Ok(())
}

/// Returns up to `limit` history entries, newest first.
pub async fn load_history(conn: &Connection, limit: usize) -> Result<Vec<HistoryEntry>, StorageError> {
    let limit = limit as i64;

    let rows = conn
        .call(move |db| {
            let mut stmt = db.prepare(
                "SELECT id, code, language, summary, submitted_at FROM history
                 ORDER BY submitted_at DESC, seq DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![limit], history_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok::<_, rusqlite::Error>(rows)
        })
        .await?;
    Ok(rows)
}
