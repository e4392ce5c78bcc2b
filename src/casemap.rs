//! IRC case-mapping functions.
//!
//! Nicknames are compared case-insensitively, but which characters fold
//! together depends on the `CASEMAPPING` the server advertises. Probe state
//! is keyed by the folded form, so two spellings of the same nick collapse
//! into one entry.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// A pure, idempotent identity folding function.
pub type Normalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Case mapping advertised by the server (ISUPPORT `CASEMAPPING`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Casemapping {
    /// Only `A-Z` fold to `a-z`.
    Ascii,
    /// ASCII plus `[]\~` → `{}|^`.
    #[default]
    Rfc1459,
    /// ASCII plus `[]\` → `{}|` (no tilde).
    StrictRfc1459,
}

impl Casemapping {
    /// Parse an ISUPPORT token value. Unknown mappings yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "ascii" => Some(Self::Ascii),
            "rfc1459" => Some(Self::Rfc1459),
            "strict-rfc1459" => Some(Self::StrictRfc1459),
            _ => None,
        }
    }

    #[inline]
    pub const fn fold_char(self, c: char) -> char {
        match (self, c) {
            (_, 'A'..='Z') => (c as u8 + 32) as char,
            (Self::Rfc1459 | Self::StrictRfc1459, '[') => '{',
            (Self::Rfc1459 | Self::StrictRfc1459, ']') => '}',
            (Self::Rfc1459 | Self::StrictRfc1459, '\\') => '|',
            (Self::Rfc1459, '~') => '^',
            _ => c,
        }
    }

    /// Fold a nickname to its comparison key.
    pub fn fold(self, s: &str) -> String {
        s.chars().map(|c| self.fold_char(c)).collect()
    }

    /// Wrap this mapping as a shareable [`Normalizer`].
    pub fn normalizer(self) -> Normalizer {
        Arc::new(move |s: &str| self.fold(s))
    }
}

impl fmt::Display for Casemapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascii => "ascii",
            Self::Rfc1459 => "rfc1459",
            Self::StrictRfc1459 => "strict-rfc1459",
        })
    }
}
