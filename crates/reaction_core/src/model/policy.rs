//! Ledger policies selected once per ledger instance.
//!
//! # Invariants
//! - A ledger applies one `SwitchPolicy` to every call it serves.

use serde::{Deserialize, Serialize};

/// What happens when an identity reacts to an item it already reacted to
/// with a different emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPolicy {
    /// Move the reaction: old counter -1, new counter +1, record rewritten.
    #[default]
    AllowSwitch,
    /// Any second reaction is rejected as `AlreadyReacted`.
    Locked,
}

/// How the ledger consults the content registry before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCheckPolicy {
    /// Unknown items are rejected; registry failures fail the call.
    Strict,
    /// Unknown items are rejected; registry failures are logged and ignored.
    #[default]
    Optimistic,
    /// The registry is never consulted.
    Disabled,
}

/// Policy bundle handed to [`crate::service::ledger_service::ReactionLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerPolicy {
    pub switch: SwitchPolicy,
    pub item_check: ItemCheckPolicy,
    pub vocabulary: crate::model::emoji::EmojiVocabulary,
}
