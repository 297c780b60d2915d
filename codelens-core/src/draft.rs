//! Local draft cache.
//!
//! Persists the editor text to a single slot so a restart restores it. Writes
//! are skipped when the text matches the last stored value; the caller decides
//! how often to call [`DraftCache::save`].

use tokio_rusqlite::Connection;

use crate::db;
use crate::error::StorageError;
use crate::language::Language;
use crate::types::CodeDraft;

pub struct DraftCache {
    conn: Connection,
    slot: String,
    last: Option<String>,
    writes: u64,
}

impl DraftCache {
    /// Opens the cache on the default slot and remembers what is stored there.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the stored draft cannot be read.
    pub async fn open(conn: Connection) -> Result<Self, StorageError> {
        Self::open_slot(conn, db::DRAFT_SLOT).await
    }

    pub async fn open_slot(conn: Connection, slot: &str) -> Result<Self, StorageError> {
        let stored = db::load_draft(&conn, slot).await?;
        Ok(Self {
            conn,
            slot: slot.to_owned(),
            last: stored.map(|d| d.text),
            writes: 0,
        })
    }

    /// Returns the stored draft, or `None` if nothing was ever saved.
    pub async fn load(&self) -> Result<Option<CodeDraft>, StorageError> {
        db::load_draft(&self.conn, &self.slot).await
    }

    /// Stores `text` unless it equals the last stored value.
    ///
    /// Returns `true` when a write happened.
    pub async fn save(&mut self, text: &str, language: Option<Language>) -> Result<bool, StorageError> {
        if self.last.as_deref() == Some(text) {
            return Ok(false);
        }
        db::store_draft(&self.conn, &self.slot, text, language).await?;
        self.last = Some(text.to_owned());
        self.writes += 1;
        tracing::trace!(bytes = text.len(), "draft saved");
        Ok(true)
    }

    /// Number of writes performed through this cache.
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}
