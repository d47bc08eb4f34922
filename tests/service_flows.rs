//! End-to-end service flows over an in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use gazette::{
    ActionRequest, ArticleId, Color, GazetteApi, OpenGraph, SearchCombinator, ServiceConfig,
    ServiceError, SqliteGraph, TagId,
};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(3304, 6, day).unwrap()
}

fn api() -> GazetteApi {
    let store = SqliteGraph::open_in_memory().unwrap();
    GazetteApi::new(Arc::new(store), ServiceConfig::default())
}

async fn add_article(api: &GazetteApi, title: &str, text: &str, day: u32) -> ArticleId {
    api.add_article(title, text, date(day)).await.unwrap().id
}

async fn tag_id(api: &GazetteApi, name: &str) -> TagId {
    api.search_tags(Some(name))
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.name == name)
        .expect("tag exists")
        .id
}

#[tokio::test]
async fn creating_the_same_tag_twice_yields_one_tag() {
    let api = api();
    api.create_tag("thargoid", None, false).await.unwrap();
    api.create_tag("thargoid", None, false).await.unwrap();

    let tags = api.search_tags(None).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "thargoid");
}

#[tokio::test]
async fn blank_tag_names_create_nothing() {
    let api = api();
    let articles = api.create_tag("  ", None, true).await.unwrap();
    assert!(articles.is_empty());
    assert!(api.search_tags(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_tag_returns_the_linked_articles() {
    let api = api();
    let a1 = add_article(&api, "One", "quiet", 1).await;

    let articles = api.create_tag("manual", Some(&a1), false).await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].id, a1);
}

#[tokio::test]
async fn bulk_tagging_links_each_matching_article_exactly_once() {
    let api = api();
    // Repeated matches inside one body still produce one link.
    let a1 = add_article(&api, "One", "thargoid thargoid thargoid", 1).await;
    let a2 = add_article(&api, "Two", "a lone thargoid", 2).await;
    add_article(&api, "Three", "nothing relevant", 3).await;

    let articles = api.create_tag("thargoid", None, true).await.unwrap();
    let mut ids: Vec<&str> = articles.iter().map(|a| a.id.as_str()).collect();
    ids.sort();
    let mut expected = vec![a1.as_str(), a2.as_str()];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn cascade_delete_fires_only_on_the_last_link() {
    let api = api();
    let a1 = add_article(&api, "One", "x", 1).await;
    let a2 = add_article(&api, "Two", "y", 2).await;
    api.create_tag("shared", Some(&a1), false).await.unwrap();
    api.create_tag("shared", Some(&a2), false).await.unwrap();
    let t = tag_id(&api, "shared").await;

    // First delete: the tag still has a2's link.
    api.edit_article_tags(&a1, &[ActionRequest::new("delete", t.as_str())])
        .await
        .unwrap();
    assert_eq!(api.search_tags(None).await.unwrap().len(), 1);

    // Second delete removes the orphaned tag.
    api.edit_article_tags(&a2, &[ActionRequest::new("delete", t.as_str())])
        .await
        .unwrap();
    assert!(api.search_tags(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_all_removes_a_multiply_linked_tag_in_one_call() {
    let api = api();
    let a1 = add_article(&api, "One", "x", 1).await;
    let a2 = add_article(&api, "Two", "y", 2).await;
    api.create_tag("wide", Some(&a1), false).await.unwrap();
    api.create_tag("wide", Some(&a2), false).await.unwrap();
    let t = tag_id(&api, "wide").await;

    api.edit_article_tags(&a1, &[ActionRequest::new("deleteAll", t.as_str())])
        .await
        .unwrap();
    assert!(api.search_tags(None).await.unwrap().is_empty());
    assert!(api.articles_for_tag(&t).await.unwrap().is_empty());
}

#[tokio::test]
async fn edit_returns_the_refreshed_tag_list() {
    let api = api();
    let a1 = add_article(&api, "One", "x", 1).await;

    let tags = api
        .edit_article_tags(
            &a1,
            &[
                ActionRequest::new("add", "first"),
                ActionRequest::new("add", "second"),
            ],
        )
        .await
        .unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.tag.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"first"));
    assert!(names.contains(&"second"));
}

#[tokio::test]
async fn unknown_actions_reject_the_batch_before_any_mutation() {
    let api = api();
    let a1 = add_article(&api, "One", "x", 1).await;

    let err = api
        .edit_article_tags(
            &a1,
            &[
                ActionRequest::new("add", "never"),
                ActionRequest::new("frobnicate", "boom"),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidAction(name) if name == "frobnicate"));
    assert!(api.search_tags(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn or_search_merges_tag_and_text_matches() {
    let api = api();
    let tagged = add_article(&api, "Attack", "a fleet appeared", 1).await;
    let texty = add_article(&api, "Travel", "witch-space ripples", 2).await;
    api.create_tag("thargoid", Some(&tagged), false).await.unwrap();

    let result = api
        .search_articles(Some("thargoid"), Some("witch-space"))
        .await
        .unwrap();
    assert_eq!(result.len(), 2);

    let tagged_entry = result.iter().find(|a| a.article.id == tagged).unwrap();
    assert_eq!(tagged_entry.tags[0].name, "thargoid");
    let texty_entry = result.iter().find(|a| a.article.id == texty).unwrap();
    assert!(texty_entry.tags.is_empty());
}

#[tokio::test]
async fn and_search_intersects_the_branches() {
    let store = SqliteGraph::open_in_memory().unwrap();
    let api = GazetteApi::new(
        Arc::new(store),
        ServiceConfig::new().with_combinator(SearchCombinator::And),
    );
    let both = add_article(&api, "Attack", "the fleet burned", 1).await;
    let tag_only = add_article(&api, "Calm", "nothing happened", 2).await;
    api.create_tag("thargoid", Some(&both), false).await.unwrap();
    api.create_tag("thargoid", Some(&tag_only), false).await.unwrap();

    let result = api
        .search_articles(Some("thargoid"), Some("fleet"))
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].article.id, both);
}

#[tokio::test]
async fn tags_for_article_reports_shared_coverage() {
    let api = api();
    let a1 = add_article(&api, "One", "x", 1).await;
    let a2 = add_article(&api, "Two", "y", 2).await;
    api.create_tag("shared", Some(&a1), false).await.unwrap();
    api.create_tag("shared", Some(&a2), false).await.unwrap();
    api.create_tag("only-one", Some(&a1), false).await.unwrap();
    api.create_tag("only-two", Some(&a2), false).await.unwrap();

    let tags = api.tags_for_article(&a1, &[a2.clone()]).await.unwrap();
    assert_eq!(tags.len(), 2);

    let shared = tags.iter().find(|t| t.tag.name == "shared").unwrap();
    assert!(shared.covers(&a1));
    assert!(shared.covers(&a2));

    let own = tags.iter().find(|t| t.tag.name == "only-one").unwrap();
    assert!(own.covers(&a1));
    assert!(!own.covers(&a2));

    // a2's unique tag never shows up on a1's listing.
    assert!(tags.iter().all(|t| t.tag.name != "only-two"));
}

#[tokio::test]
async fn link_colors_are_independent_per_user() {
    let api = api();
    let a1 = add_article(&api, "One", "x", 1).await;
    api.create_tag("colored", Some(&a1), false).await.unwrap();
    let t = tag_id(&api, "colored").await;

    api.set_link_color("alice", &a1, &t, [255, 0, 0]).await.unwrap();
    api.set_link_color("bob", &a1, &t, [0, 255, 0]).await.unwrap();

    let view = api.remove_link_color("alice", &a1, &t).await.unwrap();
    assert!(view.colors.get("alice").is_none());
    assert_eq!(view.colors.get("bob"), Some(&Color::new(0, 255, 0)));
}

#[tokio::test]
async fn color_writes_validate_channels_first() {
    let api = api();
    let a1 = add_article(&api, "One", "x", 1).await;
    api.create_tag("colored", Some(&a1), false).await.unwrap();
    let t = tag_id(&api, "colored").await;

    let err = api
        .set_link_color("alice", &a1, &t, [300, 0, 0])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn short_filters_match_literally_and_long_ones_as_substrings() {
    let api = api();
    let about_ai = add_article(&api, "Minds", "AI", 1).await;
    add_article(&api, "Grain", "maize failure", 2).await;
    let about_thargoids = add_article(&api, "War", "antithargoidal measures", 3).await;

    // "AI" stays literal: it matches the exact text but must not fire
    // inside "maize".
    let short = api.search_articles(None, Some("AI")).await.unwrap();
    assert_eq!(short.len(), 1);
    assert_eq!(short[0].article.id, about_ai);

    // "Thargoid" is wildcarded and matches inside a longer word.
    let long = api.search_articles(None, Some("Thargoid")).await.unwrap();
    assert_eq!(long.len(), 1);
    assert_eq!(long[0].article.id, about_thargoids);

    // Combined filter unions its tokens.
    let both = api.search_articles(None, Some("AI, Thargoid")).await.unwrap();
    assert_eq!(both.len(), 2);
}
