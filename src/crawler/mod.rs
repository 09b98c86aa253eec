//! Crawler module for fetching and indexing sites
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `PageFetcher` seam
//! - HTML parsing and link extraction
//! - Page indexing into lemmas and postings
//! - The recursive per-site crawl
//! - Overall crawl coordination (start, stop, single page)

mod coordinator;
mod fetcher;
mod indexer;
mod parser;
mod site_crawler;

pub use coordinator::{Coordinator, IndexingError, IndexingResponse, STOPPED_BY_USER};
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use indexer::Indexer;
pub use parser::{
    anchor_texts, extract_description, extract_links, extract_title, parse_html, visible_text,
    ParsedPage,
};
pub use site_crawler::{DiscoveredUrls, SiteCrawler};
