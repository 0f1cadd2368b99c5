//! Typed symbol keys identifying variables.
//!
//! A key pairs a type character with an index, e.g. `x1` for the first pose or `l3` for the
//! third landmark. Keys are totally ordered by `(chr, index)` and are parsed explicitly
//! through `FromStr`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Variable identifier: a character tag and an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    chr: char,
    index: u64,
}

impl Key {
    pub const fn new(chr: char, index: u64) -> Self {
        Key { chr, index }
    }

    pub fn chr(&self) -> char {
        self.chr
    }

    pub fn index(&self) -> u64 {
        self.index
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.chr, self.index)
    }
}

/// Error returned when a string is not of the form `<letter><index>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid key '{0}': expected a letter followed by an index")]
pub struct ParseKeyError(String);

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let chr = chars
            .next()
            .filter(|c| c.is_ascii_alphabetic())
            .ok_or_else(|| ParseKeyError(s.to_string()))?;
        let digits = chars.as_str();
        // digits only, without leading zeros, so parsing inverts `Display`
        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'));
        if !canonical {
            return Err(ParseKeyError(s.to_string()));
        }
        let index = digits
            .parse::<u64>()
            .map_err(|_| ParseKeyError(s.to_string()))?;
        Ok(Key::new(chr, index))
    }
}
