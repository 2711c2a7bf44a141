//! Notion object identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a Notion block, page or database.
///
/// Accepts both the 32-character hex form used in share URLs and the dashed
/// 8-4-4-4-12 form returned by the API, in any letter case. Two spellings of
/// the same id compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(Uuid);

/// A string that is not a Notion identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid Notion id: {0:?}")]
pub struct InvalidId(pub String);

impl EntityId {
    /// Parse a 32-hex or dashed identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidId`] for any other shape, including braced and URN
    /// forms.
    pub fn parse(value: &str) -> Result<Self, InvalidId> {
        let shape_ok = match value.len() {
            32 => value.bytes().all(|b| b.is_ascii_hexdigit()),
            36 => value.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => b.is_ascii_hexdigit(),
            }),
            _ => false,
        };
        if !shape_ok {
            return Err(InvalidId(value.to_owned()));
        }
        Uuid::try_parse(value)
            .map(Self)
            .map_err(|_| InvalidId(value.to_owned()))
    }

    /// The 32 lowercase hex characters, used as registry and cache key.
    #[must_use]
    pub fn compact(&self) -> String {
        self.0.simple().to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({self})")
    }
}

impl std::str::FromStr for EntityId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}
