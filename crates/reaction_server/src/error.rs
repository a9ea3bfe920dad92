use reaction_core::db::DbError;
use reaction_core::{LoggingError, ReactionValidationError};
use thiserror::Error;

/// Startup and configuration failures. Request-time failures are mapped to
/// response envelopes instead.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configured value: {0}")]
    ConfigValue(#[from] ReactionValidationError),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;
