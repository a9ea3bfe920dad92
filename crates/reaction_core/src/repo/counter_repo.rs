//! Counter aggregate: per-(item, emoji) running totals.
//!
//! # Responsibility
//! - Fast read path for display counts and leaderboards.
//! - Crate-private conditional increment/decrement used by the ledger.
//!
//! # Invariants
//! - Missing pairs read as `0`, never negative, never null.
//! - Every count change is a single conditional statement executed in the
//!   caller's transaction; there is no read-modify-write from Rust.
//! - Full listings order by `count DESC`, ties by insertion order.

use super::{count_from_db, parse_column, RepoError, RepoResult};
use crate::model::emoji::EmojiName;
use crate::model::reaction::{CounterEntry, ItemId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

/// Read contract for counter entries.
pub trait CounterRepository {
    /// Current count for `(item_id, emoji)`; `0` when the pair never existed.
    fn get_count(&self, item_id: &ItemId, emoji: &EmojiName) -> RepoResult<u64>;
    /// Counter entry for `(item_id, emoji)`, or `None` when no entry exists.
    fn find_entry(&self, item_id: &ItemId, emoji: &EmojiName)
        -> RepoResult<Option<CounterEntry>>;
    /// Emoji → count mapping for one item.
    fn list_counts(&self, item_id: &ItemId) -> RepoResult<BTreeMap<EmojiName, u64>>;
    /// Every entry across all items, `count DESC` then insertion order.
    fn list_all_counts(&self) -> RepoResult<Vec<CounterEntry>>;
    /// Creates zero-count entries for pairs that do not exist yet.
    ///
    /// Administrative pre-seeding; never changes an existing count.
    /// Returns the number of entries created.
    fn seed_item_counters(&self, item_id: &ItemId, emojis: &[EmojiName]) -> RepoResult<usize>;
}

/// SQLite-backed counter aggregate.
pub struct SqliteCounterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCounterRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Adds one to `(item_id, emoji)`, creating the entry lazily.
    ///
    /// Returns the count after the write.
    pub(crate) fn increment(&self, item_id: &ItemId, emoji: &EmojiName) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "INSERT INTO counter_entries (item_id, emoji, count)
             VALUES (?1, ?2, 1)
             ON CONFLICT (item_id, emoji) DO UPDATE SET
                count = counter_entries.count + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             RETURNING count;",
            params![item_id.as_str(), emoji.as_str()],
            |row| row.get(0),
        )?;
        count_from_db(count, "counter_entries.count")
    }

    /// Subtracts one from `(item_id, emoji)`.
    ///
    /// # Errors
    /// - `RepoError::CounterDrift` when no positive entry exists; the caller
    ///   held a live record for this pair, so the aggregate is out of step.
    pub(crate) fn decrement(&self, item_id: &ItemId, emoji: &EmojiName) -> RepoResult<u64> {
        let count: Option<i64> = self
            .conn
            .query_row(
                "UPDATE counter_entries
                 SET count = count - 1,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE item_id = ?1
                   AND emoji = ?2
                   AND count > 0
                 RETURNING count;",
                params![item_id.as_str(), emoji.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match count {
            Some(count) => count_from_db(count, "counter_entries.count"),
            None => Err(RepoError::CounterDrift {
                item_id: item_id.clone(),
                emoji: emoji.clone(),
            }),
        }
    }
}

impl CounterRepository for SqliteCounterRepository<'_> {
    fn get_count(&self, item_id: &ItemId, emoji: &EmojiName) -> RepoResult<u64> {
        Ok(self
            .find_entry(item_id, emoji)?
            .map_or(0, |entry| entry.count))
    }

    fn find_entry(
        &self,
        item_id: &ItemId,
        emoji: &EmojiName,
    ) -> RepoResult<Option<CounterEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, emoji, count
             FROM counter_entries
             WHERE item_id = ?1
               AND emoji = ?2;",
        )?;
        let mut rows = stmt.query(params![item_id.as_str(), emoji.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_counter_row(row)?));
        }
        Ok(None)
    }

    fn list_counts(&self, item_id: &ItemId) -> RepoResult<BTreeMap<EmojiName, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, emoji, count
             FROM counter_entries
             WHERE item_id = ?1;",
        )?;
        let mut rows = stmt.query([item_id.as_str()])?;
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let entry = parse_counter_row(row)?;
            counts.insert(entry.emoji, entry.count);
        }
        Ok(counts)
    }

    fn list_all_counts(&self) -> RepoResult<Vec<CounterEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, emoji, count
             FROM counter_entries
             ORDER BY count DESC, entry_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_counter_row(row)?);
        }
        Ok(entries)
    }

    fn seed_item_counters(&self, item_id: &ItemId, emojis: &[EmojiName]) -> RepoResult<usize> {
        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO counter_entries (item_id, emoji, count)
             VALUES (?1, ?2, 0);",
        )?;
        let mut created = 0;
        for emoji in emojis {
            created += stmt.execute(params![item_id.as_str(), emoji.as_str()])?;
        }
        Ok(created)
    }
}

fn parse_counter_row(row: &Row<'_>) -> RepoResult<CounterEntry> {
    let item_text: String = row.get("item_id")?;
    let emoji_text: String = row.get("emoji")?;
    Ok(CounterEntry {
        item_id: parse_column(item_text, "counter_entries.item_id", ItemId::parse)?,
        emoji: parse_column(emoji_text, "counter_entries.emoji", EmojiName::parse)?,
        count: count_from_db(row.get("count")?, "counter_entries.count")?,
    })
}
