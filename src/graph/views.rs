//! Denormalized response shapes
//!
//! Queries return flat (article, tag, link) rows; these are the grouped
//! shapes the service hands back after aggregation.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{Article, ArticleId, Color, Tag, TagId};

/// One article together with every tag linked to it in the result set.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleWithTags {
    #[serde(flatten)]
    pub article: Article,
    pub tags: Vec<Tag>,
}

/// One tag together with the ids of the articles linking to it.
///
/// For `tags_for_article` the list holds the target article plus any of
/// the caller-supplied extra articles that also carry the tag.
#[derive(Debug, Clone, Serialize)]
pub struct TagWithArticles {
    #[serde(flatten)]
    pub tag: Tag,
    pub articles: Vec<ArticleId>,
}

impl TagWithArticles {
    /// Whether the given article appears among this tag's links.
    pub fn covers(&self, article_id: &ArticleId) -> bool {
        self.articles.contains(article_id)
    }
}

/// One article-tag link with its per-user color annotations.
///
/// Storage keeps one `color_<username>` attribute per user; the view
/// models the same data as an explicit username-to-color map.
#[derive(Debug, Clone, Serialize)]
pub struct LinkView {
    pub article: ArticleId,
    pub tag: TagId,
    pub colors: BTreeMap<String, Color>,
}
