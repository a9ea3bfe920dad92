//! Reaction ledger: the only write path to records and counters.
//!
//! # Responsibility
//! - Validate reaction intents (ids, vocabulary, item existence policy).
//! - Apply the transition for one `(identity, item)` key as one atomic unit.
//! - Apply bulk intents with an all-or-nothing guard pass.
//!
//! # Invariants
//! - At most one live record per `(identity, item)`.
//! - Record and counter changes commit together or not at all; a dropped
//!   transaction rolls back both.
//! - One ledger instance applies one `SwitchPolicy` to every call.
//! - Store failures are surfaced, never retried here.

use crate::identity::IdentityError;
use crate::model::emoji::EmojiName;
use crate::model::policy::{ItemCheckPolicy, LedgerPolicy, SwitchPolicy};
use crate::model::reaction::{
    CounterDrift, IdentityId, ItemId, ReactionOutcome, ReactionValidationError,
};
use crate::registry::{ContentRegistry, RegistryError};
use crate::repo::counter_repo::{CounterRepository, SqliteCounterRepository};
use crate::repo::reaction_repo::{ReactionRepository, SqliteReactionRepository};
use crate::repo::RepoError;
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Why a request was rejected before touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRequestReason {
    /// An id or emoji field failed validation.
    Field(ReactionValidationError),
    /// The content registry does not know the item.
    UnknownItem(ItemId),
    /// Bulk request named no items.
    EmptyItemSet,
}

impl Display for InvalidRequestReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(err) => write!(f, "{err}"),
            Self::UnknownItem(item_id) => write!(f, "unknown item `{item_id}`"),
            Self::EmptyItemSet => write!(f, "item set must not be empty"),
        }
    }
}

/// Infrastructure failure behind a `StoreUnavailable` error.
#[derive(Debug)]
pub enum StoreFailure {
    Repo(RepoError),
    Registry(RegistryError),
}

impl Display for StoreFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

/// Ledger error taxonomy.
#[derive(Debug)]
pub enum LedgerError {
    /// Malformed input. Client error.
    InvalidRequest(InvalidRequestReason),
    /// Credential did not resolve. Never retried.
    IdentityUnresolved(IdentityError),
    /// The identity already holds a reaction that blocks this one.
    /// Routine business outcome, not an anomaly.
    AlreadyReacted { item_id: ItemId },
    /// Durable store failed; the atomic unit left no partial effect, so the
    /// caller may retry the whole call.
    StoreUnavailable(StoreFailure),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(reason) => write!(f, "invalid request: {reason}"),
            Self::IdentityUnresolved(err) => write!(f, "identity unresolved: {err}"),
            Self::AlreadyReacted { .. } => write!(f, "already reacted"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRequest(InvalidRequestReason::Field(err)) => Some(err),
            Self::IdentityUnresolved(err) => Some(err),
            Self::StoreUnavailable(StoreFailure::Repo(err)) => Some(err),
            Self::StoreUnavailable(StoreFailure::Registry(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        Self::StoreUnavailable(StoreFailure::Repo(value))
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(RepoError::from(value))
    }
}

impl From<ReactionValidationError> for LedgerError {
    fn from(value: ReactionValidationError) -> Self {
        Self::InvalidRequest(InvalidRequestReason::Field(value))
    }
}

impl From<IdentityError> for LedgerError {
    fn from(value: IdentityError) -> Self {
        Self::IdentityUnresolved(value)
    }
}

impl LedgerError {
    /// Stable snake_case code for logs.
    ///
    /// Store failures caused by a lock held past the busy timeout report
    /// `store_busy`, so contention is told apart from broken storage.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::IdentityUnresolved(_) => "identity_unresolved",
            Self::AlreadyReacted { .. } => "already_reacted",
            Self::StoreUnavailable(StoreFailure::Repo(RepoError::Db(err))) if err.is_busy() => {
                "store_busy"
            }
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

/// Per-item result of a bulk submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReactionResult {
    pub item_id: ItemId,
    pub outcome: ReactionOutcome,
}

/// Reaction ledger bound to one connection.
///
/// Create one per request/connection; SQLite serializes the `BEGIN
/// IMMEDIATE` units of concurrent ledgers on the same database file.
pub struct ReactionLedger<'conn, C: ContentRegistry> {
    conn: &'conn Connection,
    registry: C,
    policy: LedgerPolicy,
}

impl<'conn, C: ContentRegistry> ReactionLedger<'conn, C> {
    pub fn new(conn: &'conn Connection, registry: C, policy: LedgerPolicy) -> Self {
        Self {
            conn,
            registry,
            policy,
        }
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// Applies one reaction intent.
    ///
    /// # Contract
    /// - No record: create it, counter +1, `Created`.
    /// - Record with the same emoji: `AlreadyReacted`, no mutation.
    /// - Record with another emoji: `Switched` under `AllowSwitch`,
    ///   `AlreadyReacted` under `Locked`.
    ///
    /// # Errors
    /// - `InvalidRequest` for malformed ids/emoji, out-of-vocabulary emoji or
    ///   unknown items.
    /// - `AlreadyReacted` as described above.
    /// - `StoreUnavailable` when SQLite fails; nothing was applied.
    pub fn submit_reaction(
        &self,
        identity_id: &IdentityId,
        item_id: &str,
        emoji: &str,
    ) -> LedgerResult<ReactionOutcome> {
        let started_at = Instant::now();
        let result = self.submit_reaction_inner(identity_id, item_id, emoji);
        match &result {
            Ok(outcome) => info!(
                "event=reaction_submit module=ledger status=ok outcome={} count={} duration_ms={}",
                outcome.label(),
                outcome.count(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_rejection("reaction_submit", err, started_at),
        }
        result
    }

    /// Applies one emoji to a set of items for one identity.
    ///
    /// # Contract
    /// - Duplicate item ids collapse to their first occurrence.
    /// - If the identity holds a live reaction on any item in the set, the
    ///   whole batch fails with `AlreadyReacted` before any write.
    /// - Otherwise every item gets a `Created` outcome; the batch commits as
    ///   one unit.
    pub fn bulk_submit_reaction<S: AsRef<str>>(
        &self,
        identity_id: &IdentityId,
        item_ids: &[S],
        emoji: &str,
    ) -> LedgerResult<Vec<BulkReactionResult>> {
        let started_at = Instant::now();
        let result = self.bulk_submit_inner(identity_id, item_ids, emoji);
        match &result {
            Ok(results) => info!(
                "event=reaction_bulk_submit module=ledger status=ok items={} duration_ms={}",
                results.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_rejection("reaction_bulk_submit", err, started_at),
        }
        result
    }

    /// Compares counters of one item with a recount of its live records.
    ///
    /// Read-only; returns every mismatching `(item, emoji)` pair. Runs in one
    /// read transaction so both sides come from the same snapshot.
    pub fn audit_item(&self, item_id: &str) -> LedgerResult<Vec<CounterDrift>> {
        let item_id = ItemId::parse(item_id)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let counters = SqliteCounterRepository::new(&tx).list_counts(&item_id)?;
        let live = SqliteReactionRepository::new(&tx).live_counts_for_item(&item_id)?;
        tx.commit()?;

        let live = live.into_iter().collect::<std::collections::BTreeMap<_, _>>();
        let emojis = counters
            .keys()
            .chain(live.keys())
            .cloned()
            .collect::<BTreeSet<_>>();

        let drifts = emojis
            .into_iter()
            .filter_map(|emoji| {
                let counter = counters.get(&emoji).copied().unwrap_or(0);
                let live_records = live.get(&emoji).copied().unwrap_or(0);
                (counter != live_records).then(|| CounterDrift {
                    item_id: item_id.clone(),
                    emoji,
                    counter,
                    live_records,
                })
            })
            .collect::<Vec<_>>();

        if !drifts.is_empty() {
            warn!(
                "event=counter_audit module=ledger status=drift pairs={}",
                drifts.len()
            );
        }
        Ok(drifts)
    }

    fn submit_reaction_inner(
        &self,
        identity_id: &IdentityId,
        item_id: &str,
        emoji: &str,
    ) -> LedgerResult<ReactionOutcome> {
        let item_id = ItemId::parse(item_id)?;
        let emoji = self.policy.vocabulary.admit(emoji)?;
        self.check_item(&item_id)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let outcome = self.apply_transition(&tx, identity_id, &item_id, &emoji)?;
        tx.commit()?;
        Ok(outcome)
    }

    fn bulk_submit_inner<S: AsRef<str>>(
        &self,
        identity_id: &IdentityId,
        item_ids: &[S],
        emoji: &str,
    ) -> LedgerResult<Vec<BulkReactionResult>> {
        let emoji = self.policy.vocabulary.admit(emoji)?;
        let item_ids = dedupe_item_ids(item_ids)?;
        if item_ids.is_empty() {
            return Err(LedgerError::InvalidRequest(
                InvalidRequestReason::EmptyItemSet,
            ));
        }
        for item_id in &item_ids {
            self.check_item(item_id)?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let records = SqliteReactionRepository::new(&tx);
        let counters = SqliteCounterRepository::new(&tx);

        // Guard pass: every existing-record check completes before any write.
        let held = records.list_for_identity(identity_id, &item_ids)?;
        if let Some(conflict) = held.into_iter().next() {
            debug!(
                "event=reaction_bulk_guard module=ledger status=conflict held_emoji={}",
                conflict.emoji
            );
            return Err(LedgerError::AlreadyReacted {
                item_id: conflict.item_id,
            });
        }

        let mut results = Vec::with_capacity(item_ids.len());
        for item_id in item_ids {
            insert_or_conflict(&records, identity_id, &item_id, &emoji)?;
            let count = counters.increment(&item_id, &emoji)?;
            results.push(BulkReactionResult {
                item_id,
                outcome: ReactionOutcome::Created {
                    emoji: emoji.clone(),
                    count,
                },
            });
        }

        tx.commit()?;
        Ok(results)
    }

    /// Decides and applies the transition for one key inside `conn`'s open
    /// transaction.
    fn apply_transition(
        &self,
        conn: &Connection,
        identity_id: &IdentityId,
        item_id: &ItemId,
        emoji: &EmojiName,
    ) -> LedgerResult<ReactionOutcome> {
        let records = SqliteReactionRepository::new(conn);
        let counters = SqliteCounterRepository::new(conn);

        let Some(existing) = records.find_by_identity(identity_id, item_id)? else {
            insert_or_conflict(&records, identity_id, item_id, emoji)?;
            let count = counters.increment(item_id, emoji)?;
            return Ok(ReactionOutcome::Created {
                emoji: emoji.clone(),
                count,
            });
        };

        if existing.emoji == *emoji {
            return Err(LedgerError::AlreadyReacted {
                item_id: item_id.clone(),
            });
        }

        match self.policy.switch {
            SwitchPolicy::Locked => Err(LedgerError::AlreadyReacted {
                item_id: item_id.clone(),
            }),
            SwitchPolicy::AllowSwitch => {
                if !records.switch_record(identity_id, item_id, &existing.emoji, emoji)? {
                    return Err(RepoError::InvalidData(format!(
                        "reaction record for item `{item_id}` changed inside its transaction"
                    ))
                    .into());
                }
                let previous_count = counters.decrement(item_id, &existing.emoji)?;
                let count = counters.increment(item_id, emoji)?;
                Ok(ReactionOutcome::Switched {
                    from: existing.emoji,
                    to: emoji.clone(),
                    count,
                    previous_count,
                })
            }
        }
    }

    fn check_item(&self, item_id: &ItemId) -> LedgerResult<()> {
        if self.policy.item_check == ItemCheckPolicy::Disabled {
            return Ok(());
        }

        match self.registry.contains(item_id) {
            Ok(true) => Ok(()),
            Ok(false) => Err(LedgerError::InvalidRequest(
                InvalidRequestReason::UnknownItem(item_id.clone()),
            )),
            Err(err) if self.policy.item_check == ItemCheckPolicy::Optimistic => {
                warn!(
                    "event=item_check module=ledger status=degraded policy=optimistic error={}",
                    err
                );
                Ok(())
            }
            Err(err) => Err(LedgerError::StoreUnavailable(StoreFailure::Registry(err))),
        }
    }
}

/// Inserts a first record, translating a lost uniqueness race into
/// `AlreadyReacted`.
fn insert_or_conflict(
    records: &SqliteReactionRepository<'_>,
    identity_id: &IdentityId,
    item_id: &ItemId,
    emoji: &EmojiName,
) -> LedgerResult<()> {
    match records.insert_record(identity_id, item_id, emoji) {
        Ok(()) => Ok(()),
        Err(RepoError::Db(err)) if err.is_unique_violation() => Err(LedgerError::AlreadyReacted {
            item_id: item_id.clone(),
        }),
        Err(err) => Err(err.into()),
    }
}

fn dedupe_item_ids<S: AsRef<str>>(raw: &[S]) -> LedgerResult<Vec<ItemId>> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut item_ids = Vec::with_capacity(raw.len());
    for value in raw {
        let item_id = ItemId::parse(value)?;
        if seen.insert(item_id.clone()) {
            item_ids.push(item_id);
        }
    }
    Ok(item_ids)
}

fn log_rejection(event: &str, err: &LedgerError, started_at: Instant) {
    let duration_ms = started_at.elapsed().as_millis();
    match err {
        LedgerError::StoreUnavailable(_) => error!(
            "event={} module=ledger status=error error_code={} duration_ms={} error={}",
            event,
            err.code(),
            duration_ms,
            err
        ),
        _ => debug!(
            "event={} module=ledger status=rejected error_code={} duration_ms={}",
            event,
            err.code(),
            duration_ms
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{LedgerError, StoreFailure};
    use crate::model::reaction::ItemId;
    use crate::repo::RepoError;
    use rusqlite::ffi;

    fn sqlite_failure(code: i32) -> LedgerError {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None).into()
    }

    #[test]
    fn busy_store_failures_have_their_own_code() {
        assert_eq!(sqlite_failure(ffi::SQLITE_BUSY).code(), "store_busy");
        assert_eq!(sqlite_failure(ffi::SQLITE_LOCKED).code(), "store_busy");
        assert_eq!(sqlite_failure(ffi::SQLITE_IOERR).code(), "store_unavailable");
    }

    #[test]
    fn non_store_errors_keep_their_codes() {
        let drift = LedgerError::StoreUnavailable(StoreFailure::Repo(RepoError::InvalidData(
            "bad row".to_string(),
        )));
        assert_eq!(drift.code(), "store_unavailable");

        let conflict = LedgerError::AlreadyReacted {
            item_id: ItemId::parse("42").expect("valid id"),
        };
        assert_eq!(conflict.code(), "already_reacted");
    }
}
