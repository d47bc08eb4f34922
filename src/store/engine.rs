//! Graph engine boundary
//!
//! The service issues a closed set of parameterized statements; a
//! [`GraphEngine`] executes one statement against the underlying store
//! and returns raw rows. Mutating statements return the rows they
//! affected (a count scalar, or the updated records) so callers can
//! reconcile without a follow-up read.

use async_trait::async_trait;
use thiserror::Error;

use super::row::Row;
use crate::graph::{Article, ArticleId, Color, TagId};
use std::path::Path;

/// Errors that can occur at the store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    /// A session could not be opened or acquired.
    #[error("graph store unavailable: {0}")]
    Unavailable(String),

    /// A statement failed to execute.
    #[error("statement {statement} failed: {source}")]
    Query {
        /// Name of the failing statement, per [`Statement::name`].
        statement: &'static str,
        source: rusqlite::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(source: rusqlite::Error) -> Self {
        // Execution helpers convert with `?`; the failing statement's
        // name is attached once, at the dispatch boundary.
        StoreError::Query {
            statement: "unattributed",
            source,
        }
    }
}

impl StoreError {
    /// Attach the executing statement's name to a query failure.
    pub(crate) fn for_statement(self, statement: &'static str) -> Self {
        match self {
            StoreError::Query { source, .. } => StoreError::Query { statement, source },
            other => other,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// One parameterized statement against the graph store.
///
/// Patterns are regular expressions built by the matching engine; the
/// store applies them case-insensitively per their inline flags.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    // === Reads ===
    /// All tags, or those whose name matches the pattern, ordered by
    /// name. Rows: `tag` (node).
    TagsByPattern { pattern: Option<String> },

    /// Articles whose tags match the pattern, one row per (article,
    /// tag) pair. Rows: `article` (node), `tag` (node), `link` (edge).
    ArticlesByTagPattern { pattern: String },

    /// Articles whose title or body matches the pattern.
    /// Rows: `article` (node).
    ArticlesByText { pattern: String },

    /// Articles linked to one tag. Rows: `tag` (node), `article` (node).
    ArticlesForTag { tag_id: TagId },

    /// Tags on one article, and for each of those tags every link to
    /// the article itself or to one of the `include` articles.
    /// Rows: `tag` (node), `article` (node), `link` (edge).
    TagsForArticle {
        article_id: ArticleId,
        include: Vec<ArticleId>,
    },

    /// Remaining article links for a tag. Rows: `count` (scalar).
    CountTagLinks { tag_id: TagId },

    // === Mutations ===
    /// Upsert a tag by name: create with the given id if absent,
    /// otherwise keep the existing node untouched. Rows: `tag` (node,
    /// the surviving record).
    UpsertTag { id: TagId, name: String },

    /// Upsert an article by (title, date): create with the given id and
    /// text if absent, otherwise keep the existing node untouched.
    /// Rows: `article` (node, the surviving record).
    UpsertArticle { article: Article },

    /// Merge a link from one article to one tag. No rows when either
    /// endpoint is missing. Rows: `created` (scalar, 1 or 0).
    LinkArticleTag {
        article_id: ArticleId,
        tag_id: TagId,
    },

    /// Merge links from every article whose body matches the pattern to
    /// one tag. Rows: `linked` (scalar, number of new links).
    LinkMatchingArticles { tag_id: TagId, pattern: String },

    /// Merge a hierarchy link from a parent tag to a child tag.
    /// Rows: `created` (scalar, 1 or 0).
    LinkSubtag { parent_id: TagId, child_id: TagId },

    /// Delete the link between one article and one tag.
    /// Rows: `removed` (scalar, 1 or 0).
    UnlinkArticleTag {
        article_id: ArticleId,
        tag_id: TagId,
    },

    /// Delete a tag and all of its links, regardless of link count.
    /// Rows: `removed` (scalar, 1 if the tag existed).
    DeleteTag { tag_id: TagId },

    /// Set one user's color on an article-tag link.
    /// Rows: `article` (node), `tag` (node), `link` (edge, updated).
    SetLinkColor {
        article_id: ArticleId,
        tag_id: TagId,
        username: String,
        color: Color,
    },

    /// Remove one user's color from an article-tag link.
    /// Rows: `article` (node), `tag` (node), `link` (edge, updated).
    RemoveLinkColor {
        article_id: ArticleId,
        tag_id: TagId,
        username: String,
    },
}

impl Statement {
    /// Short statement name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Statement::TagsByPattern { .. } => "TagsByPattern",
            Statement::ArticlesByTagPattern { .. } => "ArticlesByTagPattern",
            Statement::ArticlesByText { .. } => "ArticlesByText",
            Statement::ArticlesForTag { .. } => "ArticlesForTag",
            Statement::TagsForArticle { .. } => "TagsForArticle",
            Statement::CountTagLinks { .. } => "CountTagLinks",
            Statement::UpsertTag { .. } => "UpsertTag",
            Statement::UpsertArticle { .. } => "UpsertArticle",
            Statement::LinkArticleTag { .. } => "LinkArticleTag",
            Statement::LinkMatchingArticles { .. } => "LinkMatchingArticles",
            Statement::LinkSubtag { .. } => "LinkSubtag",
            Statement::UnlinkArticleTag { .. } => "UnlinkArticleTag",
            Statement::DeleteTag { .. } => "DeleteTag",
            Statement::SetLinkColor { .. } => "SetLinkColor",
            Statement::RemoveLinkColor { .. } => "RemoveLinkColor",
        }
    }
}

/// Trait for graph store backends
///
/// Implementations must be thread-safe (Send + Sync) to support
/// concurrent statements from independent requests.
#[async_trait]
pub trait GraphEngine: Send + Sync {
    /// Execute one statement, returning its raw result rows.
    async fn execute(&self, statement: Statement) -> StoreResult<Vec<Row>>;
}

/// Extension trait for opening stores from paths
pub trait OpenGraph: GraphEngine + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StoreResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StoreResult<Self>;
}
