//! Domain model for the reaction ledger.
//!
//! # Responsibility
//! - Define validated identifiers and the two persisted shapes:
//!   per-(identity, item) reaction records and per-(item, emoji) counters.
//! - Define the ledger policies callers configure.
//!
//! # Invariants
//! - At most one live `ReactionRecord` exists per `(identity_id, item_id)`.
//! - A counter equals the number of live records with its `(item, emoji)`.

pub mod emoji;
pub mod policy;
pub mod reaction;
