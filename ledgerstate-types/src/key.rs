//! Record identity.
//!
//! A record is identified by an ordered tuple of key parts. The parts are
//! joined with `:` into the record key, and the record key is prefixed with
//! the store namespace to form the ledger key under which every partition
//! row of the record is stored.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Ordered key parts of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    parts: Vec<String>,
}

impl RecordKey {
    /// Separator between key parts.
    pub const SEPARATOR: char = ':';

    /// Builds a key from its parts.
    ///
    /// Parts must be non-empty and must not contain the separator.
    pub fn from_parts<I, S>(parts: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() {
            return Err(crate::Error::InvalidKey("no key parts".into()));
        }
        for part in &parts {
            if part.is_empty() {
                return Err(crate::Error::InvalidKey("empty key part".into()));
            }
            if part.contains(Self::SEPARATOR) {
                return Err(crate::Error::InvalidKey(format!(
                    "key part {part:?} contains '{}'",
                    Self::SEPARATOR
                )));
            }
        }
        Ok(Self { parts })
    }

    /// Parses a joined record key (`part1:part2:...`).
    pub fn parse(key: &str) -> crate::Result<Self> {
        Self::from_parts(key.split(Self::SEPARATOR))
    }

    /// Returns the individual key parts.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Returns the ledger key (`<namespace>:<key>`) for this record.
    #[must_use]
    pub fn ledger_key(&self, namespace: &str) -> String {
        format!("{namespace}{}{self}", Self::SEPARATOR)
    }

    /// Recovers a record key from a ledger key stored under `namespace`.
    ///
    /// Returns `None` if the ledger key does not belong to the namespace.
    #[must_use]
    pub fn from_ledger_key(namespace: &str, ledger_key: &str) -> Option<Self> {
        let rest = ledger_key
            .strip_prefix(namespace)?
            .strip_prefix(Self::SEPARATOR)?;
        Self::parse(rest).ok()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", Self::SEPARATOR)?;
            }
            f.write_str(part)?;
        }
        Ok(())
    }
}

impl FromStr for RecordKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RecordKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
