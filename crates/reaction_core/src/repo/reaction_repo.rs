//! Reaction record store: who reacted to which item with what.
//!
//! # Responsibility
//! - Indexed lookups by `(identity, item)` and `(emoji, item)`.
//! - Crate-private insert/switch writes used inside ledger transactions.
//!
//! # Invariants
//! - `(identity_id, item_id)` is the table's primary key; a second insert
//!   for the same pair fails with a unique violation instead of duplicating.

use super::{count_from_db, parse_column, RepoResult};
use crate::model::emoji::EmojiName;
use crate::model::reaction::{IdentityId, ItemId, ReactionRecord};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;

/// Item ids bound per `IN (...)` lookup; keeps every statement well under
/// SQLite's bound-variable limit.
const ITEM_LOOKUP_CHUNK: usize = 500;

const RECORD_SELECT_SQL: &str = "SELECT
    identity_id,
    item_id,
    emoji,
    created_at,
    updated_at
FROM reaction_records";

/// Read contract for reaction records.
pub trait ReactionRepository {
    /// Live record of `identity_id` on `item_id`, if any.
    fn find_by_identity(
        &self,
        identity_id: &IdentityId,
        item_id: &ItemId,
    ) -> RepoResult<Option<ReactionRecord>>;
    /// Earliest live record on `item_id` holding `emoji`, independent of identity.
    fn find_by_emoji(
        &self,
        emoji: &EmojiName,
        item_id: &ItemId,
    ) -> RepoResult<Option<ReactionRecord>>;
    /// Live records of `identity_id` over the given items, in item order.
    fn list_for_identity(
        &self,
        identity_id: &IdentityId,
        item_ids: &[ItemId],
    ) -> RepoResult<Vec<ReactionRecord>>;
    /// Number of live records with `(item_id, emoji)`.
    fn count_live(&self, item_id: &ItemId, emoji: &EmojiName) -> RepoResult<u64>;
    /// Live record counts for every emoji used on `item_id`.
    fn live_counts_for_item(&self, item_id: &ItemId) -> RepoResult<Vec<(EmojiName, u64)>>;
}

/// SQLite-backed reaction record store.
///
/// Accepts a plain connection or a `Transaction` (through deref), so the
/// ledger can run reads and writes inside one atomic unit.
pub struct SqliteReactionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReactionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts the first record for `(identity_id, item_id)`.
    ///
    /// A concurrent winner surfaces as a unique violation in `RepoError::Db`.
    pub(crate) fn insert_record(
        &self,
        identity_id: &IdentityId,
        item_id: &ItemId,
        emoji: &EmojiName,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO reaction_records (identity_id, item_id, emoji)
             VALUES (?1, ?2, ?3);",
            params![identity_id.as_str(), item_id.as_str(), emoji.as_str()],
        )?;
        Ok(())
    }

    /// Moves an existing record from `from` to `to`.
    ///
    /// Conditional on the record still holding `from`; returns `false` when
    /// it does not, so the caller never applies a switch decided on stale state.
    pub(crate) fn switch_record(
        &self,
        identity_id: &IdentityId,
        item_id: &ItemId,
        from: &EmojiName,
        to: &EmojiName,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE reaction_records
             SET emoji = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE identity_id = ?1
               AND item_id = ?2
               AND emoji = ?3;",
            params![
                identity_id.as_str(),
                item_id.as_str(),
                from.as_str(),
                to.as_str()
            ],
        )?;
        Ok(changed == 1)
    }
}

impl ReactionRepository for SqliteReactionRepository<'_> {
    fn find_by_identity(
        &self,
        identity_id: &IdentityId,
        item_id: &ItemId,
    ) -> RepoResult<Option<ReactionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE identity_id = ?1
               AND item_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![identity_id.as_str(), item_id.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }
        Ok(None)
    }

    fn find_by_emoji(
        &self,
        emoji: &EmojiName,
        item_id: &ItemId,
    ) -> RepoResult<Option<ReactionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE item_id = ?1
               AND emoji = ?2
             ORDER BY created_at ASC, identity_id ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params![item_id.as_str(), emoji.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }
        Ok(None)
    }

    fn list_for_identity(
        &self,
        identity_id: &IdentityId,
        item_ids: &[ItemId],
    ) -> RepoResult<Vec<ReactionRecord>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for chunk in item_ids.chunks(ITEM_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "{RECORD_SELECT_SQL}
                 WHERE identity_id = ?
                   AND item_id IN ({placeholders});"
            );
            let mut bind_values = Vec::with_capacity(chunk.len() + 1);
            bind_values.push(Value::Text(identity_id.as_str().to_string()));
            bind_values.extend(
                chunk
                    .iter()
                    .map(|item_id| Value::Text(item_id.as_str().to_string())),
            );

            let mut stmt = self.conn.prepare_cached(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            while let Some(row) = rows.next()? {
                records.push(parse_record_row(row)?);
            }
        }

        let order = item_ids
            .iter()
            .enumerate()
            .map(|(index, item_id)| (item_id, index))
            .collect::<HashMap<_, _>>();
        records.sort_by_key(|record| order.get(&record.item_id).copied().unwrap_or(usize::MAX));
        Ok(records)
    }

    fn count_live(&self, item_id: &ItemId, emoji: &EmojiName) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM reaction_records
             WHERE item_id = ?1
               AND emoji = ?2;",
            params![item_id.as_str(), emoji.as_str()],
            |row| row.get(0),
        )?;
        count_from_db(count, "COUNT(reaction_records)")
    }

    fn live_counts_for_item(&self, item_id: &ItemId) -> RepoResult<Vec<(EmojiName, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT emoji, COUNT(*) AS live
             FROM reaction_records
             WHERE item_id = ?1
             GROUP BY emoji
             ORDER BY emoji ASC;",
        )?;
        let mut rows = stmt.query([item_id.as_str()])?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next()? {
            let emoji_text: String = row.get("emoji")?;
            let emoji = parse_column(emoji_text, "reaction_records.emoji", EmojiName::parse)?;
            counts.push((emoji, count_from_db(row.get("live")?, "reaction_records")?));
        }
        Ok(counts)
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<ReactionRecord> {
    let identity_text: String = row.get("identity_id")?;
    let item_text: String = row.get("item_id")?;
    let emoji_text: String = row.get("emoji")?;

    Ok(ReactionRecord {
        identity_id: parse_column(
            identity_text,
            "reaction_records.identity_id",
            IdentityId::parse,
        )?,
        item_id: parse_column(item_text, "reaction_records.item_id", ItemId::parse)?,
        emoji: parse_column(emoji_text, "reaction_records.emoji", EmojiName::parse)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
