//! Partition addressing.

use std::fmt;

/// The partition a store call is scoped to.
///
/// `Base` is the shared partition visible to every reader. `Collection`
/// names a restricted partition visible only to its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition<'a> {
    Base,
    Collection(&'a str),
}

impl<'a> Partition<'a> {
    /// Returns the collection name, or `None` for the base partition.
    #[must_use]
    pub const fn name(&self) -> Option<&'a str> {
        match *self {
            Self::Base => None,
            Self::Collection(name) => Some(name),
        }
    }

    /// Returns true for the base partition.
    #[must_use]
    pub const fn is_base(&self) -> bool {
        matches!(self, Self::Base)
    }
}

impl<'a> From<Option<&'a str>> for Partition<'a> {
    fn from(name: Option<&'a str>) -> Self {
        match name {
            None | Some("") => Self::Base,
            Some(name) => Self::Collection(name),
        }
    }
}

impl fmt::Display for Partition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("<base>"),
            Self::Collection(name) => f.write_str(name),
        }
    }
}
