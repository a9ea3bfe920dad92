//! Emoji symbolic names and vocabulary policy.
//!
//! # Invariants
//! - Names match `^[A-Za-z0-9_+-]{1,64}$` and compare case-sensitively.
//! - A `Fixed` vocabulary only admits names it lists.

use crate::model::reaction::ReactionValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

static EMOJI_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_+\-]{1,64}$").expect("valid emoji name regex"));

/// Built-in emoji catalog offered to deployments that want a closed set.
pub const DEFAULT_EMOJI_CATALOG: &[&str] = &[
    "cheerpepe",
    "clownpepe",
    "cool",
    "cringepepepet",
    "HYPED",
    "HYPERBlob",
    "krelypie_pepe_thumbs_up",
    "love",
    "OKPepe",
    "peepoyikes_enh",
    "pepe_coolclap",
    "Pepe_HandsRainbow",
    "Pepe_Poooooopoo",
    "Pepe_PrayRainbow",
    "pepe_saber",
    "Pepe_Vanish",
    "Pepe_whiteEyes",
    "pepe_yesRainbow",
    "pepecryyay",
    "PepeGun",
    "PepeHeart",
    "PepeHmm",
    "PepeHowdy",
    "pepejob",
    "pepelaugh",
    "PepeLmfaoooo",
    "pepelove",
    "pepeplant",
    "peperun",
    "PepeYAYRunning",
    "SearchingPepe",
    "Wankge",
];

/// Well-formed emoji symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EmojiName(String);

impl EmojiName {
    /// Validates shape only; vocabulary membership is checked separately.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ReactionValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ReactionValidationError::Empty { field: "emoji" });
        }
        if !EMOJI_NAME_RE.is_match(trimmed) {
            return Err(ReactionValidationError::MalformedEmoji(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EmojiName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmojiName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which emoji names the ledger accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmojiVocabulary {
    /// Any well-formed name.
    #[default]
    Open,
    /// Only the listed names.
    Fixed(BTreeSet<EmojiName>),
}

impl EmojiVocabulary {
    /// Closed vocabulary over [`DEFAULT_EMOJI_CATALOG`].
    pub fn default_catalog() -> Self {
        Self::Fixed(
            DEFAULT_EMOJI_CATALOG
                .iter()
                .map(|name| EmojiName(name.to_string()))
                .collect(),
        )
    }

    /// Builds a closed vocabulary from raw names.
    ///
    /// # Errors
    /// - Returns the first malformed name.
    pub fn fixed<I, S>(names: I) -> Result<Self, ReactionValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(EmojiName::parse)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self::Fixed(names))
    }

    /// Parses a raw name and checks it against this vocabulary.
    pub fn admit(&self, raw: impl AsRef<str>) -> Result<EmojiName, ReactionValidationError> {
        let name = EmojiName::parse(raw)?;
        match self {
            Self::Open => Ok(name),
            Self::Fixed(names) if names.contains(&name) => Ok(name),
            Self::Fixed(_) => Err(ReactionValidationError::UnknownEmoji(name.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EmojiName, EmojiVocabulary, DEFAULT_EMOJI_CATALOG};
    use crate::model::reaction::ReactionValidationError;

    #[test]
    fn catalog_names_are_all_well_formed() {
        for name in DEFAULT_EMOJI_CATALOG {
            EmojiName::parse(name).expect("catalog name should parse");
        }
        match EmojiVocabulary::default_catalog() {
            EmojiVocabulary::Fixed(names) => assert_eq!(names.len(), DEFAULT_EMOJI_CATALOG.len()),
            EmojiVocabulary::Open => panic!("catalog must be fixed"),
        }
    }

    #[test]
    fn malformed_names_are_rejected() {
        let long = "a".repeat(65);
        for raw in ["has space", "emoji!", "😀", long.as_str()] {
            let err = EmojiName::parse(raw).expect_err("malformed name must fail");
            assert!(matches!(err, ReactionValidationError::MalformedEmoji(_)));
        }
    }

    #[test]
    fn fixed_vocabulary_is_case_sensitive() {
        let vocabulary = EmojiVocabulary::default_catalog();
        vocabulary.admit("love").expect("listed name");
        let err = vocabulary.admit("LOVE").expect_err("case differs");
        assert_eq!(err, ReactionValidationError::UnknownEmoji("LOVE".to_string()));
    }

    #[test]
    fn open_vocabulary_accepts_any_well_formed_name() {
        let name = EmojiVocabulary::Open.admit(" party_parrot ").expect("open");
        assert_eq!(name.as_str(), "party_parrot");
    }
}
