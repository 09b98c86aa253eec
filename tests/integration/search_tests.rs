//! Integration tests for search
//!
//! Sites are crawled through the coordinator first, then queried through
//! the search engine sharing the same storage.

mod common;

use common::{coordinator, html, lemmatizer, site, StaticFetcher};
use lemmadex::search::{SearchEngine, SearchError, SearchRequest};
use std::sync::Arc;

async fn indexed(sites: Vec<lemmadex::config::SiteEntry>, fetcher: StaticFetcher) -> SearchEngine {
    let (coordinator, storage) = coordinator(sites, Arc::new(fetcher));
    coordinator.start().await.unwrap();
    coordinator.wait_idle().await;
    SearchEngine::new(storage, lemmatizer())
}

fn cats_and_houses() -> StaticFetcher {
    StaticFetcher::new()
        .page(
            "https://www.example.com/",
            &html(
                "Главная",
                r#"<p>Кот, кот и дом</p><a href="/about">О нас</a>"#,
            ),
        )
        .page(
            "https://www.example.com/about/",
            &html("О нас", "<p>Наш кот</p>"),
        )
}

#[tokio::test]
async fn test_query_requires_every_lemma() {
    let engine = indexed(vec![site("https://example.com/", "Example")], cats_and_houses()).await;

    let results = engine
        .search("кот дом", Some("https://example.com/"))
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].uri, "/");
    assert_eq!(results[0].relevance, 3.0);
    assert_eq!(results[0].title, "Главная");
    assert_eq!(results[0].site, "https://www.example.com");
    assert!(results[0].snippet.contains("<b>"));
}

#[tokio::test]
async fn test_single_lemma_ranks_pages() {
    let engine = indexed(vec![site("example.com", "Example")], cats_and_houses()).await;

    let results = engine.search("коты", None).unwrap();
    let uris: Vec<&str> = results.iter().map(|r| r.uri.as_str()).collect();

    assert_eq!(uris, vec!["/", "/about/"]);
    assert_eq!(results[0].relevance, 2.0);
    assert_eq!(results[1].relevance, 1.0);
}

#[tokio::test]
async fn test_results_merge_across_sites() {
    let fetcher = cats_and_houses().page(
        "https://www.cats.org/",
        &html("Питомник", "<p>Кот кот кот кот</p>"),
    );
    let engine = indexed(
        vec![site("example.com", "Example"), site("cats.org", "Cats")],
        fetcher,
    )
    .await;

    let results = engine.search("кот", None).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].site_name, "Cats");
    assert_eq!(results[0].relevance, 4.0);
    assert!(results
        .windows(2)
        .all(|pair| pair[0].relevance >= pair[1].relevance));

    let only_example = engine.search("кот", Some("example.com")).unwrap();
    assert!(only_example.iter().all(|r| r.site_name == "Example"));
}

#[tokio::test]
async fn test_unknown_words_give_no_results() {
    let engine = indexed(vec![site("example.com", "Example")], cats_and_houses()).await;
    assert!(engine.search("сад", None).unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_query() {
    let engine = indexed(vec![site("example.com", "Example")], cats_and_houses()).await;

    assert!(matches!(engine.search("  \t", None), Err(SearchError::EmptyQuery)));

    let response = engine.execute(&SearchRequest::new(""));
    assert!(!response.result);
    assert_eq!(response.error.as_deref(), Some("Empty search query"));
    assert!(response.data.is_empty());
}

#[tokio::test]
async fn test_unknown_site() {
    let engine = indexed(vec![site("example.com", "Example")], cats_and_houses()).await;

    let result = engine.search("кот", Some("https://nowhere.net"));
    assert!(matches!(result, Err(SearchError::UnknownSite(_))));
}

#[tokio::test]
async fn test_paging_reports_total_count() {
    let engine = indexed(vec![site("example.com", "Example")], cats_and_houses()).await;

    let response = engine.execute(&SearchRequest::new("кот").offset(1).limit(5));

    assert!(response.result);
    assert_eq!(response.count, 2);
    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data[0].uri, "/about/");

    let past_end = engine.execute(&SearchRequest::new("кот").offset(10));
    assert_eq!(past_end.count, 2);
    assert!(past_end.data.is_empty());
}
