//! Statistics generation from the index database
//!
//! This module provides functionality for extracting and displaying
//! index statistics from the storage layer.

use crate::config::SiteEntry;
use crate::storage::Storage;
use crate::url::canonicalize;
use crate::LemmadexError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Shown as the status of a configured site with no stored row
pub const NOT_INDEXED: &str = "NOT INDEXED";

/// Index statistics summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<SiteStatistics>,
}

/// Totals over the configured sites
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalStatistics {
    pub sites: usize,
    pub pages: u64,
    pub lemmas: u64,
    /// True while a crawl is running
    pub indexing: bool,
}

/// Statistics of one configured site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    pub status: String,
    pub status_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub pages: u64,
    pub lemmas: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `sites` - The configured sites, in configuration order
/// * `indexing` - Whether a crawl is currently running
///
/// # Returns
///
/// * `Ok(Statistics)` - Successfully loaded statistics
/// * `Err(LemmadexError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn Storage,
    sites: &[SiteEntry],
    indexing: bool,
) -> Result<Statistics, LemmadexError> {
    let mut detailed = Vec::with_capacity(sites.len());

    for entry in sites {
        let url = canonicalize(&entry.url);

        let item = match storage.find_site_by_url(&url)? {
            Some(site) => SiteStatistics {
                pages: storage.count_pages_by_site(site.id)?,
                lemmas: storage.count_lemmas_by_site(site.id)?,
                url: site.url,
                name: site.name,
                status: site.status.to_string(),
                status_time: Some(site.status_time),
                error: site.last_error,
            },
            None => SiteStatistics {
                url,
                name: entry.name.clone(),
                status: NOT_INDEXED.to_string(),
                status_time: None,
                error: None,
                pages: 0,
                lemmas: 0,
            },
        };

        detailed.push(item);
    }

    let total = TotalStatistics {
        sites: sites.len(),
        pages: detailed.iter().map(|s| s.pages).sum(),
        lemmas: detailed.iter().map(|s| s.lemmas).sum(),
        indexing,
    };

    Ok(Statistics { total, detailed })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &Statistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.total.sites);
    println!("  Pages: {}", stats.total.pages);
    println!("  Lemmas: {}", stats.total.lemmas);
    println!(
        "  Indexing: {}",
        if stats.total.indexing { "running" } else { "idle" }
    );
    println!();

    println!("Sites:");
    for site in &stats.detailed {
        println!("  {} ({})", site.name, site.url);
        print!("    Status: {}", site.status);
        match site.status_time {
            Some(time) => println!(" since {}", time.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!(),
        }
        println!("    Pages: {}, lemmas: {}", site.pages, site.lemmas);
        if let Some(error) = &site.error {
            println!("    Last error: {}", error);
        }
    }
}
