//! Repository layer contracts and SQLite persistence implementations.
//!
//! # Responsibility
//! - Define read contracts for reaction records and counter entries.
//! - Keep SQL details away from ledger orchestration.
//!
//! # Invariants
//! - Public traits are read-only. Record and counter mutations are
//!   crate-private and only reachable through the ledger's transactions.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::emoji::EmojiName;
use crate::model::reaction::{ItemId, ReactionValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod counter_repo;
pub mod reaction_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for reaction and counter persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Persisted row cannot be converted into the domain model.
    InvalidData(String),
    /// A decrement found no positive counter for a pair that still had a
    /// live record. The enclosing transaction must not commit.
    CounterDrift { item_id: ItemId, emoji: EmojiName },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted reaction data: {message}"),
            Self::CounterDrift { item_id, emoji } => write!(
                f,
                "counter for item `{item_id}` emoji `{emoji}` is out of step with its records"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::CounterDrift { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_column<T>(
    value: String,
    column: &'static str,
    parse: impl FnOnce(String) -> Result<T, ReactionValidationError>,
) -> RepoResult<T> {
    parse(value).map_err(|err| RepoError::InvalidData(format!("{err} in {column}")))
}

pub(crate) fn count_from_db(value: i64, column: &'static str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative count `{value}` in {column}")))
}
