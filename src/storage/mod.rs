//! Storage module for persisting the index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site rows and their lifecycle status
//! - Pages, lemmas and postings of the inverted index
//! - Cascading deletion of a site's data before a re-crawl

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A configured site root
///
/// An `id` of 0 marks a record that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl SiteRecord {
    /// Creates an unsaved site record stamped with the current time
    pub fn new(url: impl Into<String>, name: impl Into<String>, status: SiteStatus) -> Self {
        Self {
            id: 0,
            url: url.into(),
            name: name.into(),
            status,
            status_time: Utc::now(),
            last_error: None,
        }
    }
}

/// A fetched page, keyed by its path relative to the site root
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// A lemma of one site and the number of its pages that contain it
#[derive(Debug, Clone, PartialEq)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    pub frequency: u32,
}

/// One inverted-index entry: a lemma's occurrence count on a page
#[derive(Debug, Clone, PartialEq)]
pub struct PostingRecord {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    pub rank: f64,
}
