//! Stable node identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a [`Node`](crate::model::Node).
///
/// Identity is stable across re-renders and is the only key the engine uses
/// for memoization and navigation. Ids are UUID-shaped in production data but
/// any non-empty string is accepted.
///
/// Deserialization is lenient (an empty id is representable) so the
/// validator can report it as a field-level error instead of failing the
/// whole parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

/// Error constructing a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeIdError {
    #[error("node id cannot be empty")]
    Empty,
}

impl NodeId {
    /// Create a node id, rejecting empty or whitespace-only strings.
    pub fn new(id: impl Into<String>) -> Result<Self, NodeIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(NodeIdError::Empty);
        }
        Ok(Self(id))
    }

    /// Mint a fresh UUID v4 id (used for nodes drafted by create requests).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the id was deserialized empty.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// True if the id parses as a UUID.
    pub fn is_uuid(&self) -> bool {
        Uuid::parse_str(&self.0).is_ok()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for NodeId {
    type Error = NodeIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
