//! Boundary contract served to HTTP/CLI callers.
//!
//! # Responsibility
//! - Resolve credentials, call the ledger or the counter read path, and map
//!   results to status-classed response envelopes.
//!
//! # Invariants
//! - Never panics; every failure becomes an `ApiResponse`.
//! - Infrastructure error details are logged, not returned to callers.
//! - Count reads go straight to the counter aggregate, not through the ledger.

use crate::identity::IdentityProvider;
use crate::model::emoji::EmojiName;
use crate::model::policy::LedgerPolicy;
use crate::model::reaction::{CounterEntry, IdentityId, ItemId};
use crate::registry::ContentRegistry;
use crate::repo::counter_repo::{CounterRepository, SqliteCounterRepository};
use crate::repo::RepoError;
use crate::service::ledger_service::{LedgerError, ReactionLedger};
use log::error;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

/// Status class of a boundary response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Ok,
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    ServerError,
}

impl ApiStatus {
    /// HTTP status code for this class.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::ServerError => 500,
        }
    }
}

/// Count of one item inside a bulk response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCount {
    pub item_id: ItemId,
    pub count: u64,
}

/// Response body shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ApiBody {
    Reacted {
        ok: bool,
        count: u64,
        outcome: &'static str,
    },
    BulkReacted {
        ok: bool,
        results: Vec<ItemCount>,
    },
    ItemCounts(BTreeMap<EmojiName, u64>),
    AllCounts(Vec<CounterEntry>),
    #[serde(rename_all = "camelCase")]
    Reaction {
        emoji: EmojiName,
        item_id: ItemId,
        count: u64,
    },
    Health {
        status: &'static str,
        version: &'static str,
    },
    Error {
        error: String,
    },
}

/// Status plus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: ApiStatus,
    pub body: ApiBody,
}

impl ApiResponse {
    fn ok(body: ApiBody) -> Self {
        Self {
            status: ApiStatus::Ok,
            body,
        }
    }

    fn error(status: ApiStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiBody::Error {
                error: message.into(),
            },
        }
    }

    /// Client error raised outside the ledger, e.g. an unreadable body.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(ApiStatus::BadRequest, message)
    }

    /// Opaque server error; the cause is expected to be logged by the caller.
    pub fn store_unavailable() -> Self {
        Self::error(ApiStatus::ServerError, "store unavailable")
    }

    /// Liveness envelope.
    pub fn health() -> Self {
        Self::ok(ApiBody::Health {
            status: "ok",
            version: crate::core_version(),
        })
    }
}

impl From<LedgerError> for ApiResponse {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::InvalidRequest(reason) => {
                Self::error(ApiStatus::BadRequest, reason.to_string())
            }
            LedgerError::IdentityUnresolved(err) => {
                Self::error(ApiStatus::Unauthorized, err.to_string())
            }
            LedgerError::AlreadyReacted { .. } => {
                Self::error(ApiStatus::Conflict, "already reacted")
            }
            LedgerError::StoreUnavailable(_) => Self::store_unavailable(),
        }
    }
}

impl From<RepoError> for ApiResponse {
    fn from(value: RepoError) -> Self {
        error!(
            "event=count_read module=api status=error error_code=store_unavailable error={}",
            value
        );
        Self::store_unavailable()
    }
}

/// Request-scoped boundary over one connection.
pub struct ReactionApi<'conn, 'p, P: IdentityProvider, C: ContentRegistry> {
    conn: &'conn Connection,
    identities: &'p P,
    ledger: ReactionLedger<'conn, C>,
}

impl<'conn, 'p, P: IdentityProvider, C: ContentRegistry> ReactionApi<'conn, 'p, P, C> {
    pub fn new(
        conn: &'conn Connection,
        identities: &'p P,
        registry: C,
        policy: LedgerPolicy,
    ) -> Self {
        Self {
            conn,
            identities,
            ledger: ReactionLedger::new(conn, registry, policy),
        }
    }

    /// `react(credential, itemId, emoji)`.
    pub fn react(&self, credential: Option<&str>, item_id: &str, emoji: &str) -> ApiResponse {
        let identity_id = match self.resolve(credential) {
            Ok(identity_id) => identity_id,
            Err(err) => return err.into(),
        };
        match self.ledger.submit_reaction(&identity_id, item_id, emoji) {
            Ok(outcome) => ApiResponse::ok(ApiBody::Reacted {
                ok: true,
                count: outcome.count(),
                outcome: outcome.label(),
            }),
            Err(err) => err.into(),
        }
    }

    /// `react-bulk(credential, itemIds, emoji)`.
    pub fn react_bulk<S: AsRef<str>>(
        &self,
        credential: Option<&str>,
        item_ids: &[S],
        emoji: &str,
    ) -> ApiResponse {
        let identity_id = match self.resolve(credential) {
            Ok(identity_id) => identity_id,
            Err(err) => return err.into(),
        };
        match self
            .ledger
            .bulk_submit_reaction(&identity_id, item_ids, emoji)
        {
            Ok(results) => ApiResponse::ok(ApiBody::BulkReacted {
                ok: true,
                results: results
                    .into_iter()
                    .map(|result| ItemCount {
                        count: result.outcome.count(),
                        item_id: result.item_id,
                    })
                    .collect(),
            }),
            Err(err) => err.into(),
        }
    }

    /// `counts(itemId?)`: one item's emoji→count mapping, or every entry
    /// sorted by count descending.
    pub fn counts(&self, item_id: Option<&str>) -> ApiResponse {
        let counters = SqliteCounterRepository::new(self.conn);
        let Some(raw) = item_id else {
            return match counters.list_all_counts() {
                Ok(entries) => ApiResponse::ok(ApiBody::AllCounts(entries)),
                Err(err) => err.into(),
            };
        };

        let item_id = match ItemId::parse(raw) {
            Ok(item_id) => item_id,
            Err(err) => return ApiResponse::error(ApiStatus::BadRequest, err.to_string()),
        };
        match counters.list_counts(&item_id) {
            Ok(counts) => ApiResponse::ok(ApiBody::ItemCounts(counts)),
            Err(err) => err.into(),
        }
    }

    /// `reaction(emoji, itemId)`: the single counter value, or not-found.
    pub fn reaction(&self, emoji: &str, item_id: &str) -> ApiResponse {
        let (emoji, item_id) = match (EmojiName::parse(emoji), ItemId::parse(item_id)) {
            (Ok(emoji), Ok(item_id)) => (emoji, item_id),
            (Err(err), _) | (_, Err(err)) => {
                return ApiResponse::error(ApiStatus::BadRequest, err.to_string())
            }
        };
        match SqliteCounterRepository::new(self.conn).find_entry(&item_id, &emoji) {
            Ok(Some(entry)) => ApiResponse::ok(ApiBody::Reaction {
                emoji: entry.emoji,
                item_id: entry.item_id,
                count: entry.count,
            }),
            Ok(None) => ApiResponse::error(ApiStatus::NotFound, "reaction not found"),
            Err(err) => err.into(),
        }
    }

    fn resolve(&self, credential: Option<&str>) -> Result<IdentityId, LedgerError> {
        let credential = credential.unwrap_or_default();
        Ok(self.identities.resolve(credential)?)
    }
}
