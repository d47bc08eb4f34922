//! Tag mutation protocol
//!
//! Orchestrates the multi-step graph mutations behind tag creation and
//! the batch edit endpoint. Steps run as individual statements, not one
//! store transaction; partial completion is observable. Cascade-delete
//! checks are deferred to end-of-batch so deletions of the same tag are
//! considered together instead of tag-by-tag.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::ServiceResult;
use crate::graph::{Article, ArticleId, Tag, TagId};
use crate::query::{build_pattern, AggregateError, MatchConfig, RowAggregator};
use crate::store::{Field, GraphEngine, Statement, Value};

use super::action::{ActionRequest, TagAction};

pub struct MutationProtocol {
    engine: Arc<dyn GraphEngine>,
    matching: MatchConfig,
}

impl MutationProtocol {
    pub fn new(engine: Arc<dyn GraphEngine>, matching: MatchConfig) -> Self {
        Self { engine, matching }
    }

    /// Upsert a tag by name, optionally link it to one article and to
    /// every article whose text matches the name. Returns the articles
    /// linked to the tag afterwards.
    ///
    /// A blank name is a defined no-op returning an empty list.
    pub async fn create_tag(
        &self,
        name: &str,
        article_id: Option<&ArticleId>,
        add_to_all_matching: bool,
    ) -> ServiceResult<Vec<Article>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }

        let tag = self.upsert_tag(name).await?;

        if let Some(article_id) = article_id {
            self.engine
                .execute(Statement::LinkArticleTag {
                    article_id: article_id.clone(),
                    tag_id: tag.id.clone(),
                })
                .await?;
        }

        if add_to_all_matching {
            // Best effort: a failed bulk application logs and reports
            // zero extra links instead of failing the create.
            match self.link_matching(&tag.id, name).await {
                Ok(linked) => debug!(tag = name, linked, "bulk-linked matching articles"),
                Err(e) => warn!(tag = name, error = %e, "bulk link skipped"),
            }
        }

        let rows = self
            .engine
            .execute(Statement::ArticlesForTag {
                tag_id: tag.id.clone(),
            })
            .await?;
        let mut agg = RowAggregator::new();
        agg.feed(&rows);
        Ok(agg.articles()?)
    }

    /// Apply one batch of tag actions to one article.
    ///
    /// The batch is validated up front; execution then runs in request
    /// order, and tags targeted by `delete` are orphan-checked once
    /// after the final action.
    pub async fn apply(&self, article_id: &ArticleId, requests: &[ActionRequest]) -> ServiceResult<()> {
        let actions = TagAction::parse_batch(requests)?;

        let mut delete_candidates: Vec<TagId> = Vec::new();
        for action in actions {
            match action {
                TagAction::Add { name } => {
                    let tag = self.upsert_tag(&name).await?;
                    self.engine
                        .execute(Statement::LinkArticleTag {
                            article_id: article_id.clone(),
                            tag_id: tag.id,
                        })
                        .await?;
                }
                TagAction::AddAll { name } => {
                    let tag = self.upsert_tag(&name).await?;
                    self.link_matching(&tag.id, &name).await?;
                }
                TagAction::Delete { tag_id } => {
                    self.engine
                        .execute(Statement::UnlinkArticleTag {
                            article_id: article_id.clone(),
                            tag_id: tag_id.clone(),
                        })
                        .await?;
                    if !delete_candidates.contains(&tag_id) {
                        delete_candidates.push(tag_id);
                    }
                }
                TagAction::DeleteAll { tag_id } => {
                    self.engine.execute(Statement::DeleteTag { tag_id }).await?;
                }
            }
        }

        // Deferred orphan sweep: every tag a `delete` touched is
        // checked once, against the state after all removals. A tag
        // re-linked later in the same batch survives.
        for tag_id in delete_candidates {
            if self.count_links(&tag_id).await? == 0 {
                self.engine
                    .execute(Statement::DeleteTag { tag_id })
                    .await?;
            }
        }

        Ok(())
    }

    /// Re-run the bulk matcher for every existing tag against the
    /// article corpus. Returns the total number of new links.
    pub async fn retag_all(&self) -> ServiceResult<usize> {
        let rows = self
            .engine
            .execute(Statement::TagsByPattern { pattern: None })
            .await?;
        let mut agg = RowAggregator::new();
        agg.feed(&rows);

        let mut linked = 0;
        for tag in agg.tags()? {
            linked += self.link_matching(&tag.id, &tag.name).await?;
        }
        Ok(linked)
    }

    /// Upsert by name, returning the surviving (canonical) tag.
    async fn upsert_tag(&self, name: &str) -> ServiceResult<Tag> {
        let rows = self
            .engine
            .execute(Statement::UpsertTag {
                id: TagId::new(),
                name: name.to_string(),
            })
            .await?;
        let mut agg = RowAggregator::new();
        agg.feed(&rows);
        agg.tags()?
            .into_iter()
            .next()
            .ok_or_else(|| AggregateError::Malformed("upsert returned no tag".to_string()).into())
    }

    async fn link_matching(&self, tag_id: &TagId, name: &str) -> ServiceResult<usize> {
        let Some(pattern) = build_pattern(name, &self.matching) else {
            return Ok(0);
        };
        let rows = self
            .engine
            .execute(Statement::LinkMatchingArticles {
                tag_id: tag_id.clone(),
                pattern,
            })
            .await?;
        Ok(scalar(&rows, "linked")?.max(0) as usize)
    }

    async fn count_links(&self, tag_id: &TagId) -> ServiceResult<i64> {
        let rows = self
            .engine
            .execute(Statement::CountTagLinks {
                tag_id: tag_id.clone(),
            })
            .await?;
        scalar(&rows, "count")
    }
}

fn scalar(rows: &[crate::store::Row], name: &str) -> ServiceResult<i64> {
    match rows.first().and_then(|r| r.get(name)) {
        Some(Field::Scalar(Value::Int(n))) => Ok(*n),
        _ => Err(AggregateError::Malformed(format!("missing `{}` scalar", name)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ServiceError;
    use crate::store::{OpenGraph, SqliteGraph};
    use chrono::NaiveDate;

    async fn setup() -> (Arc<SqliteGraph>, MutationProtocol) {
        let engine = Arc::new(SqliteGraph::open_in_memory().unwrap());
        let protocol = MutationProtocol::new(engine.clone(), MatchConfig::default());
        (engine, protocol)
    }

    async fn seed_article(engine: &SqliteGraph, id: &str, title: &str, text: &str) {
        engine
            .execute(Statement::UpsertArticle {
                article: Article {
                    id: ArticleId::from(id),
                    title: title.to_string(),
                    text: text.to_string(),
                    date: NaiveDate::from_ymd_opt(3304, 6, 1).unwrap(),
                },
            })
            .await
            .unwrap();
    }

    async fn tag_names(engine: &SqliteGraph) -> Vec<String> {
        let rows = engine
            .execute(Statement::TagsByPattern { pattern: None })
            .await
            .unwrap();
        let mut agg = RowAggregator::new();
        agg.feed(&rows);
        agg.tags().unwrap().into_iter().map(|t| t.name).collect()
    }

    #[tokio::test]
    async fn create_tag_is_idempotent() {
        let (engine, protocol) = setup().await;
        protocol.create_tag("thargoid", None, false).await.unwrap();
        protocol.create_tag("thargoid", None, false).await.unwrap();

        assert_eq!(tag_names(&engine).await, vec!["thargoid"]);
    }

    #[tokio::test]
    async fn blank_tag_names_are_a_defined_no_op() {
        let (engine, protocol) = setup().await;
        let articles = protocol.create_tag("   ", None, true).await.unwrap();
        assert!(articles.is_empty());
        assert!(tag_names(&engine).await.is_empty());
    }

    #[tokio::test]
    async fn create_tag_links_matching_articles_once_each() {
        let (engine, protocol) = setup().await;
        seed_article(&engine, "a1", "One", "thargoid thargoid thargoid").await;
        seed_article(&engine, "a2", "Two", "nothing here").await;

        let articles = protocol.create_tag("thargoid", None, true).await.unwrap();
        let ids: Vec<&str> = articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1"]);
    }

    #[tokio::test]
    async fn deleting_the_last_link_removes_the_tag() {
        let (engine, protocol) = setup().await;
        seed_article(&engine, "a1", "One", "x").await;
        seed_article(&engine, "a2", "Two", "y").await;
        let a1 = ArticleId::from("a1");
        let a2 = ArticleId::from("a2");

        protocol.create_tag("doomed", Some(&a1), false).await.unwrap();
        protocol.create_tag("doomed", Some(&a2), false).await.unwrap();
        let tag_id = {
            let rows = engine
                .execute(Statement::TagsByPattern { pattern: None })
                .await
                .unwrap();
            let mut agg = RowAggregator::new();
            agg.feed(&rows);
            agg.tags().unwrap()[0].id.clone()
        };

        protocol
            .apply(&a1, &[ActionRequest::new("delete", tag_id.as_str())])
            .await
            .unwrap();
        assert_eq!(tag_names(&engine).await, vec!["doomed"]);

        protocol
            .apply(&a2, &[ActionRequest::new("delete", tag_id.as_str())])
            .await
            .unwrap();
        assert!(tag_names(&engine).await.is_empty());
    }

    #[tokio::test]
    async fn orphan_sweep_runs_once_per_tag_at_end_of_batch() {
        let (engine, protocol) = setup().await;
        seed_article(&engine, "a1", "One", "x").await;
        let a1 = ArticleId::from("a1");
        protocol.create_tag("twice", Some(&a1), false).await.unwrap();
        let tag_id = {
            let rows = engine
                .execute(Statement::TagsByPattern { pattern: None })
                .await
                .unwrap();
            let mut agg = RowAggregator::new();
            agg.feed(&rows);
            agg.tags().unwrap()[0].id.clone()
        };

        // Two deletes naming the same tag in one batch must not trip
        // over each other.
        protocol
            .apply(
                &a1,
                &[
                    ActionRequest::new("delete", tag_id.as_str()),
                    ActionRequest::new("delete", tag_id.as_str()),
                ],
            )
            .await
            .unwrap();
        assert!(tag_names(&engine).await.is_empty());
    }

    #[tokio::test]
    async fn a_tag_re_added_later_in_the_batch_survives_the_sweep() {
        let (engine, protocol) = setup().await;
        seed_article(&engine, "a1", "One", "x").await;
        let a1 = ArticleId::from("a1");
        protocol.create_tag("phoenix", Some(&a1), false).await.unwrap();
        let tag_id = {
            let rows = engine
                .execute(Statement::TagsByPattern { pattern: None })
                .await
                .unwrap();
            let mut agg = RowAggregator::new();
            agg.feed(&rows);
            agg.tags().unwrap()[0].id.clone()
        };

        protocol
            .apply(
                &a1,
                &[
                    ActionRequest::new("delete", tag_id.as_str()),
                    ActionRequest::new("add", "phoenix"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(tag_names(&engine).await, vec!["phoenix"]);
    }

    #[tokio::test]
    async fn delete_all_removes_every_link_at_once() {
        let (engine, protocol) = setup().await;
        seed_article(&engine, "a1", "One", "x").await;
        seed_article(&engine, "a2", "Two", "y").await;
        let a1 = ArticleId::from("a1");
        let a2 = ArticleId::from("a2");
        protocol.create_tag("wide", Some(&a1), false).await.unwrap();
        protocol.create_tag("wide", Some(&a2), false).await.unwrap();
        let tag_id = {
            let rows = engine
                .execute(Statement::TagsByPattern { pattern: None })
                .await
                .unwrap();
            let mut agg = RowAggregator::new();
            agg.feed(&rows);
            agg.tags().unwrap()[0].id.clone()
        };

        protocol
            .apply(&a1, &[ActionRequest::new("deleteAll", tag_id.as_str())])
            .await
            .unwrap();
        assert!(tag_names(&engine).await.is_empty());
    }

    #[tokio::test]
    async fn invalid_actions_leave_the_store_untouched() {
        let (engine, protocol) = setup().await;
        seed_article(&engine, "a1", "One", "x").await;
        let a1 = ArticleId::from("a1");
        protocol.create_tag("kept", Some(&a1), false).await.unwrap();

        let err = protocol
            .apply(
                &a1,
                &[
                    ActionRequest::new("add", "never-created"),
                    ActionRequest::new("explode", "boom"),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidAction(_)));
        assert_eq!(tag_names(&engine).await, vec!["kept"]);
    }
}
