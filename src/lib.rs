//! Gazette: graph-backed article tagging and search service
//!
//! Articles link to tags, tags can imply other tags, and clients search
//! by tag or free text, inspect an article's tags, and annotate
//! article-tag links with per-user colors.
//!
//! # Core Concepts
//!
//! - **Articles** and **Tags**: nodes, merged on natural keys (title
//!   plus date, tag name) so repeated writes never duplicate them
//! - **Links**: Article→Tag edges carrying per-user color annotations
//! - **Matching**: regex patterns built from filter tokens, wildcarded
//!   by a length heuristic, drive both search and automatic tagging
//!
//! # Example
//!
//! ```
//! use gazette::{OpenGraph, SqliteGraph};
//!
//! let store = SqliteGraph::open_in_memory().unwrap();
//! // Wrap it in a GazetteApi to serve requests.
//! ```

mod annotate;
mod api;
mod config;
mod graph;
pub mod id;
mod mutation;
pub mod query;
pub mod store;

pub use api::{GazetteApi, ServiceError, ServiceResult};
pub use config::{SearchCombinator, ServiceConfig};
pub use graph::{
    color_property, split_property, Article, ArticleId, ArticleWithTags, Color, ColorError,
    LinkView, Tag, TagId, TagWithArticles, COLOR_PREFIX,
};
pub use mutation::{ActionRequest, MutationProtocol, TagAction};
pub use query::{build_pattern, AggregateError, MatchConfig, RowAggregator};
pub use store::{
    EdgeRecord, Field, GraphEngine, NodeRecord, OpenGraph, Row, SqliteGraph, Statement,
    StoreError, StoreResult, Value,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
