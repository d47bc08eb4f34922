//! Domain types for articles, tags, and their links

mod article;
mod link;
mod tag;
mod views;

pub use article::{Article, ArticleId};
pub use link::{color_property, split_property, Color, ColorError, COLOR_PREFIX};
pub use tag::{Tag, TagId};
pub use views::{ArticleWithTags, LinkView, TagWithArticles};
