//! Tag representation

use serde::{Deserialize, Serialize};

/// Generated identifier for a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Create a new random tag id.
    pub fn new() -> Self {
        Self(crate::id::short_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TagId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TagId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A tag in the graph.
///
/// The display name is unique across the store; creating a tag with an
/// existing name merges onto the existing node instead of duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier
    pub id: TagId,
    /// Display name (stored under the `tag` attribute)
    #[serde(rename = "tag")]
    pub name: String,
}

impl Tag {
    /// Create a new tag with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TagId::new(),
            name: name.into(),
        }
    }
}
