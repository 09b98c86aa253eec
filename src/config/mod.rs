//! Configuration module for lemmadex
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use lemmadex::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("lemmadex.toml")).unwrap();
//! println!("Request delay: {}ms", config.crawler.request_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ConnectionConfig, CrawlerConfig, MorphologyConfig, SiteEntry, StorageConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
