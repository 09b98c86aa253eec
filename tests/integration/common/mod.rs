//! Shared fixtures for the integration tests
//!
//! Site roots are canonicalized to `https://www.` URLs, so crawls run
//! against an in-memory fetcher instead of a local mock server.

#![allow(dead_code)]

use async_trait::async_trait;
use lemmadex::config::SiteEntry;
use lemmadex::crawler::{extract_links, Coordinator, FetchError, FetchedPage, PageFetcher};
use lemmadex::lemma::{Lemmatizer, PartOfSpeech, RussianMorphology};
use lemmadex::storage::SqliteStorage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Serves canned HTML keyed by canonical URL and records every request
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, (u16, String)>,
    delay: Option<Duration>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), (200, html.to_string()));
        self
    }

    pub fn status(mut self, url: &str, status: u16, html: &str) -> Self {
        self.pages.insert(url.to_string(), (status, html.to_string()));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let (status_code, content) = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NetworkError(format!("connection refused: {}", url)))?;

        let base = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let links = extract_links(&content, &base);

        Ok(FetchedPage {
            url: url.to_string(),
            status_code,
            content,
            links,
        })
    }
}

/// Wraps body markup in a minimal HTML document
pub fn html(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

/// A lemmatizer that only knows a handful of nouns
pub fn lemmatizer() -> Arc<Lemmatizer> {
    let model = RussianMorphology::from_entries([
        ("кот", "кот", PartOfSpeech::Noun),
        ("кота", "кот", PartOfSpeech::Noun),
        ("коты", "кот", PartOfSpeech::Noun),
        ("котов", "кот", PartOfSpeech::Noun),
        ("дом", "дом", PartOfSpeech::Noun),
        ("дома", "дом", PartOfSpeech::Noun),
        ("сад", "сад", PartOfSpeech::Noun),
        ("саду", "сад", PartOfSpeech::Noun),
        ("пёс", "пёс", PartOfSpeech::Noun),
        ("пса", "пёс", PartOfSpeech::Noun),
    ])
    .with_stemming(false);
    Arc::new(Lemmatizer::new(model))
}

pub fn site(url: &str, name: &str) -> SiteEntry {
    SiteEntry {
        url: url.to_string(),
        name: name.to_string(),
    }
}

/// Builds a coordinator over in-memory storage
pub fn coordinator(
    sites: Vec<SiteEntry>,
    fetcher: Arc<StaticFetcher>,
) -> (Coordinator, Arc<SqliteStorage>) {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let coordinator =
        Coordinator::new(sites, storage.clone(), fetcher, lemmatizer()).with_pool_size(2);
    (coordinator, storage)
}
