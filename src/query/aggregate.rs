//! Result aggregator
//!
//! Folds flat result rows (one article-tag pair per row, entities
//! repeating freely) into deduplicated entity objects keyed by store
//! identity, then shapes them into the grouped views the service
//! returns. Feeding is cumulative: successive batches from separate
//! queries land in the same backing map, which is how tag-match and
//! free-text search results merge into one article list.

use std::collections::HashMap;

use serde_json::{json, Map as JsonMap};
use thiserror::Error;

use crate::graph::{
    split_property, Article, ArticleId, ArticleWithTags, Color, LinkView, Tag, TagId,
    TagWithArticles, COLOR_PREFIX,
};
use crate::store::{EdgeRecord, Field, NodeRecord, Row};

/// Errors raised while canonicalizing rows.
#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    /// An edge references a node absent from the consumed rows.
    #[error("edge {edge_type}.{identity} references a node not in the result set")]
    UnresolvedEndpoint { edge_type: String, identity: i64 },

    /// A node lacks an attribute its label requires.
    #[error("{label} node {identity} is missing attribute `{attribute}`")]
    MissingAttribute {
        identity: i64,
        label: String,
        attribute: &'static str,
    },

    /// A value that exists but cannot be interpreted.
    #[error("malformed row data: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EntityKey {
    Node(i64),
    /// `<edgeType>.<edgeIdentity>`; edge identities live in a separate
    /// space from node identities.
    Edge(String),
}

#[derive(Debug, Clone)]
enum Entity {
    Node(NodeRecord),
    Edge(EdgeRecord),
}

/// Identity-keyed accumulator over raw result rows.
#[derive(Debug, Default)]
pub struct RowAggregator {
    order: Vec<EntityKey>,
    entities: HashMap<EntityKey, Entity>,
    /// (article identity, tag identity) adjacencies, first-seen order.
    pairs: Vec<(i64, i64)>,
}

impl RowAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one batch of rows. May be called once per query branch.
    pub fn feed(&mut self, rows: &[Row]) -> &mut Self {
        for row in rows {
            let mut article_identity = None;
            let mut tag_identity = None;

            for (_, field) in row.fields() {
                match field {
                    Field::Node(node) => {
                        match node.label.as_str() {
                            "Article" => article_identity = Some(node.identity),
                            "Tag" => tag_identity = Some(node.identity),
                            _ => {}
                        }
                        self.insert(EntityKey::Node(node.identity), Entity::Node(node.clone()));
                    }
                    Field::Edge(edge) => {
                        let key =
                            EntityKey::Edge(format!("{}.{}", edge.edge_type, edge.identity));
                        self.insert(key, Entity::Edge(edge.clone()));
                    }
                    Field::Scalar(_) => {}
                }
            }

            // An article and a tag sharing a row are linked.
            if let (Some(article), Some(tag)) = (article_identity, tag_identity) {
                if !self.pairs.contains(&(article, tag)) {
                    self.pairs.push((article, tag));
                }
            }
        }
        self
    }

    /// First occurrence wins; repeats of the same identity are only
    /// used for adjacency, never merged into the stored entity.
    fn insert(&mut self, key: EntityKey, entity: Entity) {
        if !self.entities.contains_key(&key) {
            self.order.push(key.clone());
            self.entities.insert(key, entity);
        }
    }

    fn node(&self, identity: i64) -> Option<&NodeRecord> {
        match self.entities.get(&EntityKey::Node(identity)) {
            Some(Entity::Node(node)) => Some(node),
            _ => None,
        }
    }

    /// External `id` of a node, for resolving edge endpoints.
    fn external_id(&self, identity: i64, edge: &EdgeRecord) -> Result<String, AggregateError> {
        let node = self
            .node(identity)
            .ok_or_else(|| AggregateError::UnresolvedEndpoint {
                edge_type: edge.edge_type.clone(),
                identity: edge.identity,
            })?;
        Ok(require(node, "id")?.to_string())
    }

    fn nodes_with_label(&self) -> impl Iterator<Item = &NodeRecord> {
        self.order.iter().filter_map(|key| match self.entities.get(key) {
            Some(Entity::Node(node)) => Some(node),
            _ => None,
        })
    }

    fn edges(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.order.iter().filter_map(|key| match self.entities.get(key) {
            Some(Entity::Edge(edge)) => Some(edge),
            _ => None,
        })
    }

    // === Canonical output ===

    /// Every accumulated entity as a canonical JSON object, insertion
    /// order. Nodes become `{ label, ...properties }`; edges become
    /// `{ type, from, to, ...properties }` with endpoint identities
    /// resolved to external ids and per-user attribute names folded to
    /// their prefix (`color_alice` surfaces as `color`).
    pub fn entities(&self) -> Result<Vec<serde_json::Value>, AggregateError> {
        let mut out = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let value = match &self.entities[key] {
                Entity::Node(node) => {
                    let mut obj = JsonMap::new();
                    obj.insert("label".to_string(), json!(node.label));
                    for (name, value) in &node.properties {
                        obj.insert(name.clone(), to_json(value));
                    }
                    serde_json::Value::Object(obj)
                }
                Entity::Edge(edge) => {
                    let mut obj = JsonMap::new();
                    obj.insert("type".to_string(), json!(edge.edge_type));
                    obj.insert("from".to_string(), json!(self.external_id(edge.start, edge)?));
                    obj.insert("to".to_string(), json!(self.external_id(edge.end, edge)?));
                    for (name, value) in &edge.properties {
                        let (prefix, _) = split_property(name);
                        obj.insert(prefix.to_string(), to_json(value));
                    }
                    serde_json::Value::Object(obj)
                }
            };
            out.push(value);
        }
        Ok(out)
    }

    // === Typed shapes ===

    /// Accumulated articles, first-seen order.
    pub fn articles(&self) -> Result<Vec<Article>, AggregateError> {
        self.nodes_with_label()
            .filter(|n| n.label == "Article")
            .map(article_from)
            .collect()
    }

    /// Accumulated tags, first-seen order.
    pub fn tags(&self) -> Result<Vec<Tag>, AggregateError> {
        self.nodes_with_label()
            .filter(|n| n.label == "Tag")
            .map(tag_from)
            .collect()
    }

    /// Articles with the tags they shared rows with, both in first-seen
    /// order. Articles that never met a tag carry an empty list.
    pub fn articles_with_tags(&self) -> Result<Vec<ArticleWithTags>, AggregateError> {
        let mut out = Vec::new();
        for node in self.nodes_with_label().filter(|n| n.label == "Article") {
            let mut tags = Vec::new();
            for (article, tag) in &self.pairs {
                if *article == node.identity {
                    let tag_node =
                        self.node(*tag)
                            .ok_or_else(|| AggregateError::Malformed(format!(
                                "paired tag {} not in the result set",
                                tag
                            )))?;
                    tags.push(tag_from(tag_node)?);
                }
            }
            out.push(ArticleWithTags {
                article: article_from(node)?,
                tags,
            });
        }
        Ok(out)
    }

    /// Tags with the ids of the articles they shared rows with.
    pub fn tags_with_articles(&self) -> Result<Vec<TagWithArticles>, AggregateError> {
        let mut out = Vec::new();
        for node in self.nodes_with_label().filter(|n| n.label == "Tag") {
            let mut articles = Vec::new();
            for (article, tag) in &self.pairs {
                if *tag == node.identity {
                    let article_node =
                        self.node(*article)
                            .ok_or_else(|| AggregateError::Malformed(format!(
                                "paired article {} not in the result set",
                                article
                            )))?;
                    articles.push(ArticleId::from(require(article_node, "id")?));
                }
            }
            out.push(TagWithArticles {
                tag: tag_from(node)?,
                articles,
            });
        }
        Ok(out)
    }

    /// Accumulated article-tag links with their per-user colors.
    pub fn link_views(&self) -> Result<Vec<LinkView>, AggregateError> {
        let mut out = Vec::new();
        for edge in self.edges() {
            let mut colors = std::collections::BTreeMap::new();
            for (name, value) in &edge.properties {
                let (prefix, suffix) = split_property(name);
                if prefix != COLOR_PREFIX {
                    continue;
                }
                let Some(username) = suffix else { continue };
                let color = Color::try_from(value)
                    .map_err(|e| AggregateError::Malformed(format!("{}: {}", name, e)))?;
                colors.insert(username.to_string(), color);
            }
            out.push(LinkView {
                article: ArticleId::from(self.external_id(edge.start, edge)?),
                tag: TagId::from(self.external_id(edge.end, edge)?),
                colors,
            });
        }
        Ok(out)
    }
}

fn require<'a>(node: &'a NodeRecord, attribute: &'static str) -> Result<&'a str, AggregateError> {
    node.str_property(attribute)
        .ok_or(AggregateError::MissingAttribute {
            identity: node.identity,
            label: node.label.clone(),
            attribute,
        })
}

fn article_from(node: &NodeRecord) -> Result<Article, AggregateError> {
    let date_raw = require(node, "date")?;
    let date = date_raw.parse().map_err(|_| {
        AggregateError::Malformed(format!("unparseable article date `{}`", date_raw))
    })?;
    Ok(Article {
        id: ArticleId::from(require(node, "id")?),
        title: require(node, "title")?.to_string(),
        text: require(node, "text")?.to_string(),
        date,
    })
}

fn tag_from(node: &NodeRecord) -> Result<Tag, AggregateError> {
    Ok(Tag {
        id: TagId::from(require(node, "id")?),
        name: require(node, "tag")?.to_string(),
    })
}

fn to_json(value: &crate::store::Value) -> serde_json::Value {
    // Value serializes untagged, so this cannot fail.
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
