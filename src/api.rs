//! Transport-independent API layer.
//!
//! `GazetteApi` is the single entry point for all consumer-facing
//! operations. Transports (HTTP, CLI, direct embedding) call its
//! methods; they never reach into the protocol, annotator, or engine
//! directly. Every operation returns the affected entity set so callers
//! can reconcile state without a follow-up read.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::error;

use crate::annotate::LinkAnnotator;
use crate::config::{SearchCombinator, ServiceConfig};
use crate::graph::{
    Article, ArticleId, ArticleWithTags, LinkView, Tag, TagId, TagWithArticles,
};
use crate::mutation::{ActionRequest, MutationProtocol};
use crate::query::{build_pattern, AggregateError, RowAggregator};
use crate::store::{GraphEngine, Row, Statement, StoreError};

/// Errors surfaced at the operation boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("store failure")]
    Store(#[from] StoreError),

    #[error("aggregation failure: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("unknown action `{0}`")]
    InvalidAction(String),

    #[error("{0}")]
    Validation(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Single entry point for all consumer-facing operations.
pub struct GazetteApi {
    engine: Arc<dyn GraphEngine>,
    config: ServiceConfig,
    protocol: MutationProtocol,
    annotator: LinkAnnotator,
}

impl GazetteApi {
    pub fn new(engine: Arc<dyn GraphEngine>, config: ServiceConfig) -> Self {
        let protocol = MutationProtocol::new(engine.clone(), config.matching.clone());
        let annotator = LinkAnnotator::new(engine.clone());
        Self {
            engine,
            config,
            protocol,
            annotator,
        }
    }

    // --- Reads ---

    /// All tags, or those matching the filter, ordered by name.
    pub async fn search_tags(&self, filter: Option<&str>) -> ServiceResult<Vec<Tag>> {
        let pattern = filter.and_then(|f| build_pattern(f, &self.config.matching));
        let rows = self
            .engine
            .execute(Statement::TagsByPattern { pattern })
            .await?;
        let mut agg = RowAggregator::new();
        agg.feed(&rows);
        Ok(agg.tags()?)
    }

    /// Articles by tag filter, free-text filter, or both.
    ///
    /// The two branches execute concurrently; either branch's failure
    /// fails the operation. With both filters present the configured
    /// combinator decides whether the result is the union or the
    /// intersection of the branches.
    pub async fn search_articles(
        &self,
        tag_filter: Option<&str>,
        article_filter: Option<&str>,
    ) -> ServiceResult<Vec<ArticleWithTags>> {
        let tag_pattern = tag_filter.and_then(|f| build_pattern(f, &self.config.matching));
        let text_pattern = article_filter.and_then(|f| build_pattern(f, &self.config.matching));

        let tag_branch = async {
            match &tag_pattern {
                Some(pattern) => {
                    self.engine
                        .execute(Statement::ArticlesByTagPattern {
                            pattern: pattern.clone(),
                        })
                        .await
                }
                None => Ok(Vec::new()),
            }
        };
        let text_branch = async {
            match &text_pattern {
                Some(pattern) => {
                    self.engine
                        .execute(Statement::ArticlesByText {
                            pattern: pattern.clone(),
                        })
                        .await
                }
                None => Ok(Vec::new()),
            }
        };
        let (tag_rows, text_rows) = tokio::try_join!(tag_branch, text_branch)?;

        let intersect = self.config.combinator == SearchCombinator::And
            && tag_pattern.is_some()
            && text_pattern.is_some();

        if intersect {
            // Tags come from the tag branch; the text branch only
            // restricts which articles survive.
            let mut tag_agg = RowAggregator::new();
            tag_agg.feed(&tag_rows);
            let mut text_agg = RowAggregator::new();
            text_agg.feed(&text_rows);
            let text_ids: HashSet<ArticleId> = text_agg
                .articles()?
                .into_iter()
                .map(|a| a.id)
                .collect();
            let mut merged = tag_agg.articles_with_tags()?;
            merged.retain(|a| text_ids.contains(&a.article.id));
            Ok(merged)
        } else {
            let mut agg = RowAggregator::new();
            agg.feed(&text_rows).feed(&tag_rows);
            Ok(agg.articles_with_tags()?)
        }
    }

    /// Articles linked to one tag.
    pub async fn articles_for_tag(&self, tag_id: &TagId) -> ServiceResult<Vec<Article>> {
        let rows = self
            .engine
            .execute(Statement::ArticlesForTag {
                tag_id: tag_id.clone(),
            })
            .await?;
        let mut agg = RowAggregator::new();
        agg.feed(&rows);
        Ok(agg.articles()?)
    }

    /// Tags on one article. Each tag also lists which of the supplied
    /// extra articles carry it, for "related articles" views.
    pub async fn tags_for_article(
        &self,
        article_id: &ArticleId,
        include: &[ArticleId],
    ) -> ServiceResult<Vec<TagWithArticles>> {
        let rows = self
            .engine
            .execute(Statement::TagsForArticle {
                article_id: article_id.clone(),
                include: include.to_vec(),
            })
            .await?;
        let mut agg = RowAggregator::new();
        agg.feed(&rows);
        Ok(agg.tags_with_articles()?)
    }

    // --- Mutations ---

    /// Upsert a tag by name, optionally linking it to one article and
    /// to every article matching the name. Returns the articles linked
    /// to the tag afterwards; a blank name is a no-op returning none.
    pub async fn create_tag(
        &self,
        name: &str,
        article_id: Option<&ArticleId>,
        add_to_all_matching: bool,
    ) -> ServiceResult<Vec<Article>> {
        self.protocol
            .create_tag(name, article_id, add_to_all_matching)
            .await
    }

    /// Apply a batch of tag actions to one article, then return its
    /// refreshed tag list.
    pub async fn edit_article_tags(
        &self,
        article_id: &ArticleId,
        actions: &[ActionRequest],
    ) -> ServiceResult<Vec<TagWithArticles>> {
        self.protocol.apply(article_id, actions).await?;
        self.tags_for_article(article_id, &[]).await
    }

    /// Set one user's color on an article-tag link.
    pub async fn set_link_color(
        &self,
        username: &str,
        article_id: &ArticleId,
        tag_id: &TagId,
        color: [i64; 3],
    ) -> ServiceResult<LinkView> {
        self.annotator
            .set_color(username, article_id, tag_id, color)
            .await
    }

    /// Remove one user's color from an article-tag link.
    pub async fn remove_link_color(
        &self,
        username: &str,
        article_id: &ArticleId,
        tag_id: &TagId,
    ) -> ServiceResult<LinkView> {
        self.annotator.remove_color(username, article_id, tag_id).await
    }

    // --- Ingestion ---

    /// Upsert an article by (title, date). Re-ingesting an existing
    /// article keeps its id and original text.
    pub async fn add_article(
        &self,
        title: &str,
        text: &str,
        date: NaiveDate,
    ) -> ServiceResult<Article> {
        let rows = self
            .engine
            .execute(Statement::UpsertArticle {
                article: Article::new(title, text, date),
            })
            .await?;
        self.single_article(rows)
    }

    /// Record a subtag relationship between two existing tags.
    pub async fn link_subtag(&self, parent_id: &TagId, child_id: &TagId) -> ServiceResult<()> {
        self.engine
            .execute(Statement::LinkSubtag {
                parent_id: parent_id.clone(),
                child_id: child_id.clone(),
            })
            .await?;
        Ok(())
    }

    /// Re-run the bulk matcher for every existing tag against the
    /// article corpus. Returns the number of new links.
    pub async fn retag(&self) -> ServiceResult<usize> {
        self.protocol.retag_all().await
    }

    fn single_article(&self, rows: Vec<Row>) -> ServiceResult<Article> {
        let mut agg = RowAggregator::new();
        agg.feed(&rows);
        agg.articles()?.into_iter().next().ok_or_else(|| {
            error!("article upsert returned no rows");
            AggregateError::Malformed("article upsert returned no rows".to_string()).into()
        })
    }
}
