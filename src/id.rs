//! PSP disc / game identifiers (`ULUS10565`, `NPJH50465`, ...).
//!
//! An identifier is a publisher prefix from a closed set of four-letter
//! codes followed by a five-digit number. In the wild it shows up with a
//! separator (`ULUS-10565`, `ULUS_10565`, `ULUS 10565`), in lower case, or
//! embedded in longer names such as `ULUS10565SAVE00` or
//! `God of War [ULUS-10565].iso`. [`recognize`] finds the first one and
//! returns it in canonical form: upper case, no separator.
//!
//! A run of more than five digits never matches as a five-digit code, so
//! `ULUS105651` is rejected rather than truncated.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Publisher prefixes recognised in identifiers.
pub const PREFIXES: &[&str] = &[
    "ULUS", "ULES", "ULJM", "ULJS", "ULKS", "ULKP", "UCUS", "UCES", "UCAS", "UCJS", "NPJH", "NPUH",
    "NPUG", "NPPA", "NPEZ", "NPHG",
];

static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let prefixes = PREFIXES.join("|");
    // The trailing group stands in for a "not followed by a digit" assertion.
    Regex::new(&format!(r"(?i)({prefixes})[-_ ]?([0-9]{{5}})(?:[^0-9]|$)"))
        .expect("identifier pattern compiles")
});

/// A canonical game identifier: known prefix + five digits, upper case.
///
/// The only ways to obtain one are [`recognize`] and [`FromStr`], both of
/// which reject anything that is not well formed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameId(String);

impl GameId {
    /// The canonical text, e.g. `ULUS10565`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The four-letter publisher prefix.
    pub fn prefix(&self) -> &str {
        &self.0[..4]
    }

    /// The five-digit number.
    pub fn number(&self) -> &str {
        &self.0[4..]
    }
}

/// Find the first identifier in `text`.
///
/// Only the first successful match is returned; later candidates in the
/// same string are ignored.
pub fn recognize(text: &str) -> Option<GameId> {
    let caps = PATTERN.captures(text)?;
    let prefix = caps.get(1)?.as_str().to_ascii_uppercase();
    let digits = caps.get(2)?.as_str();
    Some(GameId(format!("{prefix}{digits}")))
}

impl FromStr for GameId {
    type Err = Error;

    /// Parse a string that consists of exactly one identifier, separators
    /// and case allowed (`ulus-10565` parses, `ULUS10565SAVE00` does not).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let id = recognize(trimmed).ok_or(Error::Parse("not a game identifier"))?;
        let compact: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        if compact.eq_ignore_ascii_case(id.as_str()) {
            Ok(id)
        } else {
            Err(Error::Parse("not a game identifier"))
        }
    }
}

impl TryFrom<String> for GameId {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<GameId> for String {
    fn from(id: GameId) -> Self {
        id.0
    }
}

impl AsRef<str> for GameId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
