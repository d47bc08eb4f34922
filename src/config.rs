//! Service configuration

use serde::{Deserialize, Serialize};

use crate::query::MatchConfig;

/// How `search_articles` combines its tag-match and free-text branches
/// when both filters are supplied.
///
/// With a single filter, the lone branch's result is used under either
/// combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchCombinator {
    /// Union of both branches.
    #[default]
    Or,
    /// Articles present in both branches; tags come from the tag branch.
    And,
}

/// Tunable behavior of the service layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub combinator: SearchCombinator,
    pub matching: MatchConfig,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_combinator(mut self, combinator: SearchCombinator) -> Self {
        self.combinator = combinator;
        self
    }

    pub fn with_matching(mut self, matching: MatchConfig) -> Self {
        self.matching = matching;
        self
    }
}
