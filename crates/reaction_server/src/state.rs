use crate::config::ServerConfig;
use crate::error::ServerResult;
use reaction_core::{LedgerPolicy, TokenTableIdentityProvider};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared request state. Connections are opened per request, so only
/// immutable configuration lives here.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db_path: Arc<PathBuf>,
    pub identities: Arc<TokenTableIdentityProvider>,
    pub policy: Arc<LedgerPolicy>,
}

impl AppState {
    pub fn new(
        db_path: impl Into<PathBuf>,
        identities: TokenTableIdentityProvider,
        policy: LedgerPolicy,
    ) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
            identities: Arc::new(identities),
            policy: Arc::new(policy),
        }
    }

    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        Ok(Self::new(
            config.db_path.clone(),
            config.identity_provider()?,
            config.ledger_policy()?,
        ))
    }
}
