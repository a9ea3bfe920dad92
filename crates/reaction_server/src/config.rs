use crate::error::{ServerError, ServerResult};
use reaction_core::{
    default_log_level, EmojiVocabulary, IdentityId, ItemCheckPolicy, LedgerPolicy, SwitchPolicy,
    TokenTableIdentityProvider,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "REACTION_DB_PATH";
pub const ENV_BIND_ADDR: &str = "REACTION_BIND_ADDR";
pub const ENV_LOG_LEVEL: &str = "REACTION_LOG_LEVEL";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
    pub switch_policy: SwitchPolicy,
    pub item_check: ItemCheckPolicy,
    /// Closed emoji vocabulary; any well-formed name is accepted when unset.
    pub vocabulary: Option<Vec<String>>,
    /// Bearer token → identity id.
    pub tokens: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: PathBuf::from("reactions.db"),
            log_level: default_log_level().to_string(),
            log_dir: None,
            switch_policy: SwitchPolicy::default(),
            item_check: ItemCheckPolicy::default(),
            vocabulary: None,
            tokens: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Applies `REACTION_*` environment overrides.
    pub fn with_env_overrides(self) -> ServerResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by the `REACTION_*` names.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ServerResult<Self> {
        if let Some(db_path) = lookup(ENV_DB_PATH) {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(bind_addr) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = bind_addr.parse().map_err(|_| {
                ServerError::Config(format!("{ENV_BIND_ADDR} is not a socket address: {bind_addr}"))
            })?;
        }
        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        Ok(self)
    }

    pub fn ledger_policy(&self) -> ServerResult<LedgerPolicy> {
        let vocabulary = match &self.vocabulary {
            Some(names) if names.is_empty() => {
                return Err(ServerError::Config(
                    "vocabulary must list at least one emoji when set".to_string(),
                ))
            }
            Some(names) => EmojiVocabulary::fixed(names)?,
            None => EmojiVocabulary::Open,
        };
        Ok(LedgerPolicy {
            switch: self.switch_policy,
            item_check: self.item_check,
            vocabulary,
        })
    }

    pub fn identity_provider(&self) -> ServerResult<TokenTableIdentityProvider> {
        self.tokens
            .iter()
            .map(|(token, identity_id)| {
                if token.trim().is_empty() {
                    return Err(ServerError::Config("token must not be blank".to_string()));
                }
                Ok((token.trim().to_string(), IdentityId::parse(identity_id)?))
            })
            .collect()
    }
}
