//! Link annotation
//!
//! Sets or clears one user's color on one article-tag link. The store
//! keeps the annotation under `color_<username>` on the link itself, so
//! different users' colors live side by side and stay independent.
//! Clearing removes the attribute; there is no sentinel value and no
//! history, last write wins.

use std::sync::Arc;

use crate::api::{ServiceError, ServiceResult};
use crate::graph::{ArticleId, Color, ColorError, LinkView, TagId};
use crate::query::RowAggregator;
use crate::store::{GraphEngine, Statement};

pub struct LinkAnnotator {
    engine: Arc<dyn GraphEngine>,
}

impl LinkAnnotator {
    pub fn new(engine: Arc<dyn GraphEngine>) -> Self {
        Self { engine }
    }

    /// Set `username`'s color on the (article, tag) link.
    ///
    /// The raw channels must be exactly three integers in 0-255; any
    /// upstream scaling happens before this call.
    pub async fn set_color(
        &self,
        username: &str,
        article_id: &ArticleId,
        tag_id: &TagId,
        color: [i64; 3],
    ) -> ServiceResult<LinkView> {
        let color = Color::try_from(color).map_err(validation)?;
        let rows = self
            .engine
            .execute(Statement::SetLinkColor {
                article_id: article_id.clone(),
                tag_id: tag_id.clone(),
                username: username.to_string(),
                color,
            })
            .await?;
        self.into_view(rows, article_id, tag_id)
    }

    /// Remove `username`'s color from the (article, tag) link.
    pub async fn remove_color(
        &self,
        username: &str,
        article_id: &ArticleId,
        tag_id: &TagId,
    ) -> ServiceResult<LinkView> {
        let rows = self
            .engine
            .execute(Statement::RemoveLinkColor {
                article_id: article_id.clone(),
                tag_id: tag_id.clone(),
                username: username.to_string(),
            })
            .await?;
        self.into_view(rows, article_id, tag_id)
    }

    fn into_view(
        &self,
        rows: Vec<crate::store::Row>,
        article_id: &ArticleId,
        tag_id: &TagId,
    ) -> ServiceResult<LinkView> {
        let mut agg = RowAggregator::new();
        agg.feed(&rows);
        agg.link_views()?.into_iter().next().ok_or_else(|| {
            ServiceError::Validation(format!(
                "no link between article {} and tag {}",
                article_id, tag_id
            ))
        })
    }
}

fn validation(e: ColorError) -> ServiceError {
    ServiceError::Validation(e.to_string())
}
