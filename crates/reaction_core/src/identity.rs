//! Identity provider contract.
//!
//! # Responsibility
//! - Turn an opaque bearer credential into a resolved `IdentityId`.
//!
//! # Invariants
//! - Credentials are never logged or echoed in error messages.

use crate::model::reaction::IdentityId;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Credential could not be resolved to an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    MissingCredential,
    UnknownCredential,
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "credential is missing"),
            Self::UnknownCredential => write!(f, "credential is not recognized"),
        }
    }
}

impl Error for IdentityError {}

/// Resolves bearer credentials to identities.
pub trait IdentityProvider {
    fn resolve(&self, credential: &str) -> Result<IdentityId, IdentityError>;
}

/// Static token → identity table, typically loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct TokenTableIdentityProvider {
    tokens: HashMap<String, IdentityId>,
}

impl TokenTableIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one token binding.
    pub fn insert(&mut self, token: impl Into<String>, identity_id: IdentityId) {
        self.tokens.insert(token.into(), identity_id);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl FromIterator<(String, IdentityId)> for TokenTableIdentityProvider {
    fn from_iter<T: IntoIterator<Item = (String, IdentityId)>>(iter: T) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl IdentityProvider for TokenTableIdentityProvider {
    fn resolve(&self, credential: &str) -> Result<IdentityId, IdentityError> {
        let token = credential.trim();
        if token.is_empty() {
            return Err(IdentityError::MissingCredential);
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or(IdentityError::UnknownCredential)
    }
}
