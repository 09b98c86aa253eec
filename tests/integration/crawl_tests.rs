//! Integration tests for the crawler
//!
//! These tests drive full crawls through the coordinator against an
//! in-memory fetcher and in-memory SQLite storage.

mod common;

use common::{coordinator, html, site, StaticFetcher};
use lemmadex::crawler::{IndexingError, IndexingResponse, STOPPED_BY_USER};
use lemmadex::state::SiteStatus;
use lemmadex::storage::{SqliteStorage, Storage};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const ROOT: &str = "https://www.example.com/";

/// A small site: two sections, one broken link and one external link
fn example_site() -> StaticFetcher {
    StaticFetcher::new()
        .page(
            ROOT,
            &html(
                "Главная",
                r#"<p>Кот и дом</p>
                   <a href="/news">Новости</a>
                   <a href="/about">О нас</a>
                   <a href="https://www.other.com/">Чужой</a>
                   <a href="https://www.example.com/news/#top">Наверх</a>"#,
            ),
        )
        .page(
            "https://www.example.com/news/",
            &html(
                "Новости",
                r#"<p>Кота видели в саду</p>
                   <a href="/news/1">Первая</a>
                   <a href="/">Главная</a>"#,
            ),
        )
        .status(
            "https://www.example.com/news/1/",
            404,
            &html("Нет", "<p>кот кот кот</p>"),
        )
        .page(
            "https://www.example.com/about/",
            &html("О нас", r#"<p>Пёс и кот</p><a href="/news/">Новости</a>"#),
        )
}

fn paths(storage: &SqliteStorage, site_id: i64) -> Vec<String> {
    let mut paths: Vec<String> = storage
        .find_all_pages_by_site(site_id)
        .unwrap()
        .into_iter()
        .map(|p| p.path)
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let fetcher = Arc::new(example_site());
    let (coordinator, storage) = coordinator(vec![site("example.com", "Example")], fetcher.clone());

    coordinator.start().await.unwrap();
    coordinator.wait_idle().await;

    let site = storage.find_site_by_url(ROOT).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.name, "Example");
    assert!(site.last_error.is_none());

    assert_eq!(paths(&storage, site.id), vec!["/", "/about/", "/news/", "/news/1/"]);

    // Every URL is fetched once and nothing outside the root is touched
    let requests = fetcher.requests();
    let unique: HashSet<&String> = requests.iter().collect();
    assert_eq!(requests.len(), 4);
    assert_eq!(unique.len(), 4);
    assert!(requests.iter().all(|url| url.starts_with(ROOT)));
    assert!(requests.iter().all(|url| !url.contains('#')));
}

#[tokio::test]
async fn test_error_pages_have_no_postings() {
    let fetcher = Arc::new(example_site());
    let (coordinator, storage) = coordinator(vec![site("example.com", "Example")], fetcher);

    coordinator.start().await.unwrap();
    coordinator.wait_idle().await;

    let site = storage.find_site_by_url(ROOT).unwrap().unwrap();
    let broken = storage
        .find_page_by_path_and_site("/news/1/", site.id)
        .unwrap()
        .unwrap();

    assert_eq!(broken.code, 404);
    assert!(storage.find_all_postings_by_page(broken.id).unwrap().is_empty());

    // "кот" is on /, /news/ and /about/ but not on the 404 page
    let cat = storage.find_lemma_by_text_and_site("кот", site.id).unwrap().unwrap();
    assert_eq!(cat.frequency, 3);
}

#[tokio::test]
async fn test_frequency_matches_postings() {
    let fetcher = Arc::new(example_site());
    let (coordinator, storage) = coordinator(vec![site("example.com", "Example")], fetcher);

    coordinator.start().await.unwrap();
    coordinator.wait_idle().await;

    let site = storage.find_site_by_url(ROOT).unwrap().unwrap();
    let lemmas = storage.find_all_lemmas_by_site(site.id).unwrap();
    assert!(!lemmas.is_empty());

    for lemma in lemmas {
        let postings = storage.find_all_postings_by_lemma(lemma.id).unwrap();
        assert_eq!(lemma.frequency as usize, postings.len(), "lemma {}", lemma.lemma);
        assert!(postings.iter().all(|p| p.rank >= 1.0));
    }
}

#[tokio::test]
async fn test_restart_replaces_previous_index() {
    let fetcher = Arc::new(example_site());
    let (coordinator, storage) = coordinator(vec![site("example.com", "Example")], fetcher);

    coordinator.start().await.unwrap();
    coordinator.wait_idle().await;
    let first = storage.find_site_by_url(ROOT).unwrap().unwrap();

    coordinator.start().await.unwrap();
    coordinator.wait_idle().await;
    let second = storage.find_site_by_url(ROOT).unwrap().unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(storage.find_all_sites().unwrap().len(), 1);
    assert_eq!(storage.count_total_pages().unwrap(), 4);

    let cat = storage.find_lemma_by_text_and_site("кот", second.id).unwrap().unwrap();
    assert_eq!(cat.frequency, 3);
}

#[tokio::test]
async fn test_network_failure_marks_site_failed() {
    let fetcher = Arc::new(
        StaticFetcher::new().page(ROOT, &html("Главная", r#"<a href="/missing">Пропало</a>"#)),
    );
    let (coordinator, storage) = coordinator(vec![site("example.com", "Example")], fetcher);

    coordinator.start().await.unwrap();
    coordinator.wait_idle().await;

    let site = storage.find_site_by_url(ROOT).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Failed);
    assert!(site.last_error.unwrap().starts_with("NetworkError"));
    assert_eq!(paths(&storage, site.id), vec!["/"]);
}

#[tokio::test]
async fn test_sites_crawl_independently() {
    let fetcher = Arc::new(
        example_site()
            .page("https://www.other.com/", &html("Другой", r#"<a href="/gone">?</a>"#)),
    );
    let (coordinator, storage) = coordinator(
        vec![site("example.com", "Example"), site("other.com", "Other")],
        fetcher,
    );

    coordinator.start().await.unwrap();
    coordinator.wait_idle().await;

    let example = storage.find_site_by_url(ROOT).unwrap().unwrap();
    let other = storage
        .find_site_by_url("https://www.other.com/")
        .unwrap()
        .unwrap();

    assert_eq!(example.status, SiteStatus::Indexed);
    assert_eq!(other.status, SiteStatus::Failed);
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let fetcher = Arc::new(example_site().delay(Duration::from_millis(100)));
    let (coordinator, _storage) = coordinator(vec![site("example.com", "Example")], fetcher);

    coordinator.start().await.unwrap();

    let response = IndexingResponse::from(coordinator.start().await);
    assert!(!response.result);
    assert_eq!(response.error.as_deref(), Some("Indexing is already running"));

    coordinator.wait_idle().await;
}

#[tokio::test]
async fn test_stop_settles_every_site() {
    let fetcher = Arc::new(example_site().delay(Duration::from_millis(200)));
    let (coordinator, storage) = coordinator(vec![site("example.com", "Example")], fetcher);

    coordinator.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    coordinator.stop().await.unwrap();

    assert!(!coordinator.is_running());
    for site in storage.find_all_sites().unwrap() {
        assert_ne!(site.status, SiteStatus::Indexing);
        assert_eq!(site.status, SiteStatus::Failed);
        assert_eq!(site.last_error.as_deref(), Some(STOPPED_BY_USER));
    }

    // Stopping again has nothing to stop
    assert!(matches!(coordinator.stop().await, Err(IndexingError::NotRunning)));
}

#[tokio::test]
async fn test_index_one_page_twice() {
    let fetcher = Arc::new(example_site());
    let (coordinator, storage) = coordinator(vec![site("example.com", "Example")], fetcher);

    coordinator
        .index_one_page("http://example.com/news")
        .await
        .unwrap();
    coordinator
        .index_one_page("https://www.example.com/news/")
        .await
        .unwrap();

    let site = storage.find_site_by_url(ROOT).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(paths(&storage, site.id), vec!["/news/"]);

    let cat = storage.find_lemma_by_text_and_site("кот", site.id).unwrap().unwrap();
    let garden = storage.find_lemma_by_text_and_site("сад", site.id).unwrap().unwrap();
    assert_eq!(cat.frequency, 1);
    assert_eq!(garden.frequency, 1);
}

#[tokio::test]
async fn test_index_one_page_after_crawl_keeps_frequencies() {
    let fetcher = Arc::new(example_site());
    let (coordinator, storage) = coordinator(vec![site("example.com", "Example")], fetcher);

    coordinator.start().await.unwrap();
    coordinator.wait_idle().await;

    coordinator.index_one_page("https://www.example.com/about/").await.unwrap();

    let site = storage.find_site_by_url(ROOT).unwrap().unwrap();
    let cat = storage.find_lemma_by_text_and_site("кот", site.id).unwrap().unwrap();
    let dog = storage.find_lemma_by_text_and_site("пёс", site.id).unwrap().unwrap();
    assert_eq!(cat.frequency, 3);
    assert_eq!(dog.frequency, 1);
    assert_eq!(storage.count_pages_by_site(site.id).unwrap(), 4);
}

#[tokio::test]
async fn test_index_one_page_out_of_scope() {
    let fetcher = Arc::new(example_site());
    let (coordinator, storage) = coordinator(vec![site("example.com", "Example")], fetcher.clone());

    let response = IndexingResponse::from(
        coordinator
            .index_one_page("https://www.other.com/page")
            .await,
    );

    assert!(!response.result);
    assert!(response.error.is_some());
    assert!(fetcher.requests().is_empty());
    assert!(storage.find_all_sites().unwrap().is_empty());
}

#[tokio::test]
async fn test_index_one_page_network_error() {
    let fetcher = Arc::new(example_site());
    let (coordinator, _storage) = coordinator(vec![site("example.com", "Example")], fetcher);

    let result = coordinator
        .index_one_page("https://www.example.com/missing/")
        .await;

    assert!(matches!(result, Err(IndexingError::Network(_))));
}
