//! Article representation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable external identifier for an article.
///
/// Distinct from the store's internal numeric identity; this is the id
/// clients see, and it never changes once the article exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    /// Create a new random article id.
    pub fn new() -> Self {
        Self(crate::id::short_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ArticleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ArticleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A news article in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: ArticleId,
    pub title: String,
    /// Full article body
    pub text: String,
    /// Publication date (ISO calendar date)
    pub date: NaiveDate,
}

impl Article {
    /// Create a new article with a generated id.
    pub fn new(title: impl Into<String>, text: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: ArticleId::new(),
            title: title.into(),
            text: text.into(),
            date,
        }
    }
}
