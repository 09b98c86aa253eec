//! lemmadex: a site crawler with a Russian lemma index
//!
//! This crate crawls a configured set of site roots, indexes their pages by
//! the lemmas of their words, and answers ranked keyword queries with
//! highlighted snippets.

pub mod config;
pub mod crawler;
pub mod lemma;
pub mod output;
pub mod search;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for lemmadex operations
#[derive(Debug, Error)]
pub enum LemmadexError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Indexing error: {0}")]
    Indexing(#[from] crawler::IndexingError),

    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),

    #[error("Morphology error: {0}")]
    Morphology(#[from] lemma::MorphologyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for lemmadex operations
pub type Result<T> = std::result::Result<T, LemmadexError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Coordinator;
pub use search::SearchEngine;
pub use state::SiteStatus;
pub use crate::url::canonicalize;
