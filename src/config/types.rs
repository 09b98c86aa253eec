use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for lemmadex
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub morphology: MorphologyConfig,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

/// Identity the fetcher presents to crawled sites
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Value of the `User-Agent` header
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Value of the `Referer` header
    pub referrer: String,
}

/// Crawler pacing and pool settings
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Delay before every request (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Permits in each site's worker pool; the CPU count when unset
    #[serde(rename = "pool-size", default)]
    pub pool_size: Option<usize>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            pool_size: None,
        }
    }
}

fn default_request_delay_ms() -> u64 {
    150
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Morphology model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MorphologyConfig {
    /// Optional tab-separated dictionary (`form`, `normal form`, tag)
    #[serde(rename = "dictionary-path", default)]
    pub dictionary_path: Option<PathBuf>,

    /// Reduce words missing from the dictionary with the Snowball stemmer
    #[serde(rename = "stem-unknown-words", default = "default_true")]
    pub stem_unknown_words: bool,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            dictionary_path: None,
            stem_unknown_words: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One configured site root
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Root URL; canonicalized before use
    pub url: String,

    /// Display name
    pub name: String,
}
