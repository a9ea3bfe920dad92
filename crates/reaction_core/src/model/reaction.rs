//! Reaction identifiers, records, counters and outcomes.
//!
//! # Invariants
//! - Identifiers are trimmed, non-empty, at most `MAX_ID_CHARS` characters
//!   and free of control characters.
//! - Emoji names are validated by [`crate::model::emoji::EmojiName`].

use crate::model::emoji::EmojiName;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum character length accepted for identity and item identifiers.
pub const MAX_ID_CHARS: usize = 128;

/// Validation errors for raw identifier and emoji inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionValidationError {
    /// Field is empty after trim.
    Empty { field: &'static str },
    /// Field exceeds the accepted length.
    TooLong { field: &'static str, max: usize },
    /// Field contains control characters.
    ControlCharacter { field: &'static str },
    /// Emoji name does not match the symbolic-name pattern.
    MalformedEmoji(String),
    /// Emoji name is well-formed but outside the configured vocabulary.
    UnknownEmoji(String),
}

impl Display for ReactionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::TooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::ControlCharacter { field } => {
                write!(f, "{field} must not contain control characters")
            }
            Self::MalformedEmoji(value) => write!(f, "malformed emoji name `{value}`"),
            Self::UnknownEmoji(value) => write!(f, "emoji `{value}` is not in the vocabulary"),
        }
    }
}

impl Error for ReactionValidationError {}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Validates and wraps a raw identifier.
            pub fn parse(raw: impl AsRef<str>) -> Result<Self, ReactionValidationError> {
                validate_opaque_id(raw.as_ref(), $field).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Resolved caller identity. Opaque beyond equality.
    IdentityId,
    "identity_id"
);

opaque_id!(
    /// Content item a reaction attaches to. Opaque beyond equality.
    ItemId,
    "item_id"
);

fn validate_opaque_id(raw: &str, field: &'static str) -> Result<String, ReactionValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ReactionValidationError::Empty { field });
    }
    if trimmed.chars().count() > MAX_ID_CHARS {
        return Err(ReactionValidationError::TooLong {
            field,
            max: MAX_ID_CHARS,
        });
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ReactionValidationError::ControlCharacter { field });
    }
    Ok(trimmed.to_string())
}

/// The live reaction an identity holds on one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRecord {
    pub identity_id: IdentityId,
    pub item_id: ItemId,
    pub emoji: EmojiName,
    /// Epoch ms of the first reaction.
    pub created_at: i64,
    /// Epoch ms of the latest switch (equals `created_at` until one happens).
    pub updated_at: i64,
}

/// Running total for one `(item, emoji)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterEntry {
    pub item_id: ItemId,
    pub emoji: EmojiName,
    pub count: u64,
}

/// Successful result of applying one reaction intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ReactionOutcome {
    /// First reaction of this identity to this item.
    Created {
        emoji: EmojiName,
        /// Counter value for `(item, emoji)` after the write.
        count: u64,
    },
    /// Existing reaction moved to a different emoji.
    Switched {
        from: EmojiName,
        to: EmojiName,
        /// Counter value for `(item, to)` after the write.
        count: u64,
        /// Counter value for `(item, from)` after the write.
        previous_count: u64,
    },
}

impl ReactionOutcome {
    /// Counter value of the emoji this outcome left the identity holding.
    pub fn count(&self) -> u64 {
        match self {
            Self::Created { count, .. } | Self::Switched { count, .. } => *count,
        }
    }

    /// Stable lowercase label used in logs and response envelopes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Switched { .. } => "switched",
        }
    }
}

/// Counter mismatch reported by a consistency audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterDrift {
    pub item_id: ItemId,
    pub emoji: EmojiName,
    /// Value stored in `counter_entries`.
    pub counter: u64,
    /// Live records with this `(item, emoji)`.
    pub live_records: u64,
}
