//! Emoji reaction ledger core.
//!
//! Records which identity reacted to which content item with which emoji,
//! keeps per-(item, emoji) counters in step with those records, and
//! enforces one live reaction per identity per item under concurrent use.

pub mod api;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod registry;
pub mod repo;
pub mod service;

pub use api::{ApiBody, ApiResponse, ApiStatus, ItemCount, ReactionApi};
pub use identity::{IdentityError, IdentityProvider, TokenTableIdentityProvider};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::emoji::{EmojiName, EmojiVocabulary, DEFAULT_EMOJI_CATALOG};
pub use model::policy::{ItemCheckPolicy, LedgerPolicy, SwitchPolicy};
pub use model::reaction::{
    CounterDrift, CounterEntry, IdentityId, ItemId, ReactionOutcome, ReactionRecord,
    ReactionValidationError,
};
pub use registry::{
    ContentRegistry, ContentTier, InMemoryContentRegistry, RegistryError, SqliteContentRegistry,
};
pub use repo::counter_repo::{CounterRepository, SqliteCounterRepository};
pub use repo::reaction_repo::{ReactionRepository, SqliteReactionRepository};
pub use repo::{RepoError, RepoResult};
pub use service::ledger_service::{
    BulkReactionResult, InvalidRequestReason, LedgerError, LedgerResult, ReactionLedger,
    StoreFailure,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
