//! Content registry contract and implementations.
//!
//! # Responsibility
//! - Answer "does this item exist" for the ledger's item check.
//! - Keep catalog semantics (tiers, slugs, links) out of the ledger.
//!
//! # Invariants
//! - `contains` is a pure existence check; it never creates items.

use crate::db::DbError;
use crate::model::reaction::ItemId;
use log::info;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registry lookup failure. The item may or may not exist.
#[derive(Debug)]
pub enum RegistryError {
    Db(DbError),
    Unavailable(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "content registry unavailable: {message}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for RegistryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Existence lookup for content items.
pub trait ContentRegistry {
    fn contains(&self, item_id: &ItemId) -> Result<bool, RegistryError>;
}

/// Catalog tier of a registered item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentTier {
    Free,
    Vip,
}

impl ContentTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Vip => "vip",
        }
    }
}

/// Registry backed by the `content_items` table.
pub struct SqliteContentRegistry<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContentRegistry<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Registers an item id. Idempotent; an existing item keeps its tier.
    ///
    /// Returns `true` when the item was newly registered.
    pub fn register_item(&self, item_id: &ItemId, tier: ContentTier) -> Result<bool, RegistryError> {
        let created = self.conn.execute(
            "INSERT OR IGNORE INTO content_items (item_id, tier) VALUES (?1, ?2);",
            params![item_id.as_str(), tier.as_str()],
        )?;
        if created == 1 {
            info!(
                "event=content_register module=registry status=ok tier={}",
                tier.as_str()
            );
        }
        Ok(created == 1)
    }
}

impl ContentRegistry for SqliteContentRegistry<'_> {
    fn contains(&self, item_id: &ItemId) -> Result<bool, RegistryError> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM content_items
                WHERE item_id = ?1
            );",
            [item_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

/// Set-backed registry for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentRegistry {
    items: HashSet<ItemId>,
}

impl InMemoryContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, item_id: ItemId) -> bool {
        self.items.insert(item_id)
    }
}

impl ContentRegistry for InMemoryContentRegistry {
    fn contains(&self, item_id: &ItemId) -> Result<bool, RegistryError> {
        Ok(self.items.contains(item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentRegistry, ContentTier, InMemoryContentRegistry, SqliteContentRegistry};
    use crate::db::open_db_in_memory;
    use crate::model::reaction::ItemId;

    fn item(raw: &str) -> ItemId {
        ItemId::parse(raw).expect("valid item id")
    }

    #[test]
    fn sqlite_registry_registers_idempotently() {
        let conn = open_db_in_memory().expect("open db");
        let registry = SqliteContentRegistry::new(&conn);

        assert!(!registry.contains(&item("42")).expect("lookup"));
        assert!(registry
            .register_item(&item("42"), ContentTier::Free)
            .expect("register"));
        assert!(!registry
            .register_item(&item("42"), ContentTier::Vip)
            .expect("register again"));
        assert!(registry.contains(&item("42")).expect("lookup"));

        let tier: String = conn
            .query_row(
                "SELECT tier FROM content_items WHERE item_id = '42';",
                [],
                |row| row.get(0),
            )
            .expect("tier row");
        assert_eq!(tier, "free");
    }

    #[test]
    fn in_memory_registry_answers_membership() {
        let registry = InMemoryContentRegistry::with_items([item("1"), item("2")]);
        assert!(registry.contains(&item("1")).expect("lookup"));
        assert!(!registry.contains(&item("3")).expect("lookup"));
    }
}
