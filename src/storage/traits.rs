//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{LemmaRecord, PageRecord, PostingRecord, SiteRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("Lemma not found: {0}")]
    LemmaNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every method takes `&self`: implementations synchronise internally so a
/// single backend can be shared by all crawl tasks and the search engine.
/// Records with `id == 0` are inserted by the `save_*` methods, which return
/// the assigned id; records with a non-zero id are updated in place.
pub trait Storage: Send + Sync {
    // ===== Sites =====

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    fn save_site(&self, site: &SiteRecord) -> StorageResult<i64>;

    /// Deletes a site with all of its postings, lemmas and pages
    fn delete_site(&self, site_id: i64) -> StorageResult<()>;

    fn find_all_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    // ===== Pages =====

    fn find_page_by_id(&self, page_id: i64) -> StorageResult<Option<PageRecord>>;

    fn find_page_by_path_and_site(
        &self,
        path: &str,
        site_id: i64,
    ) -> StorageResult<Option<PageRecord>>;

    fn save_page(&self, page: &PageRecord) -> StorageResult<i64>;

    fn find_all_pages_by_site(&self, site_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Deletes a site's pages together with their postings
    fn delete_all_pages_by_site(&self, site_id: i64) -> StorageResult<()>;

    fn count_pages_by_site(&self, site_id: i64) -> StorageResult<u64>;

    // ===== Lemmas =====

    fn find_lemma_by_text_and_site(
        &self,
        lemma: &str,
        site_id: i64,
    ) -> StorageResult<Option<LemmaRecord>>;

    fn find_lemma_by_id(&self, lemma_id: i64) -> StorageResult<Option<LemmaRecord>>;

    fn save_lemma(&self, lemma: &LemmaRecord) -> StorageResult<i64>;

    fn delete_lemma(&self, lemma_id: i64) -> StorageResult<()>;

    fn find_all_lemmas_by_site(&self, site_id: i64) -> StorageResult<Vec<LemmaRecord>>;

    /// Deletes a site's lemmas together with their postings
    fn delete_all_lemmas_by_site(&self, site_id: i64) -> StorageResult<()>;

    fn count_lemmas_by_site(&self, site_id: i64) -> StorageResult<u64>;

    // ===== Postings =====

    fn save_posting(&self, posting: &PostingRecord) -> StorageResult<i64>;

    fn find_all_postings_by_lemma(&self, lemma_id: i64) -> StorageResult<Vec<PostingRecord>>;

    fn find_all_postings_by_page(&self, page_id: i64) -> StorageResult<Vec<PostingRecord>>;

    fn delete_all_postings_by_page(&self, page_id: i64) -> StorageResult<()>;

    /// Ranks of the given lemmas on one page
    ///
    /// Lemmas without a posting on the page contribute nothing.
    fn find_ranks_for_page_and_lemmas(
        &self,
        page_id: i64,
        lemma_ids: &[i64],
    ) -> StorageResult<Vec<f64>>;

    // ===== Indexing =====

    /// Writes a page together with its postings as one unit
    ///
    /// `lemmas` holds `(lemma, rank)` pairs for the page's site. Each pair
    /// adds one to the lemma's frequency, creating the lemma if needed, and
    /// stores a posting with the rank.
    ///
    /// The page is matched by site and path; its `id` is ignored. When the
    /// path is already stored, nothing is written and `None` is returned
    /// unless `replace` is set. A replaced page first gives back one unit of
    /// frequency per old posting, and lemmas left at zero are deleted.
    ///
    /// Either the whole write is applied or none of it.
    fn index_page(
        &self,
        page: &PageRecord,
        lemmas: &[(String, f64)],
        replace: bool,
    ) -> StorageResult<Option<i64>>;

    // ===== Statistics =====

    fn count_total_pages(&self) -> StorageResult<u64>;

    fn count_total_lemmas(&self) -> StorageResult<u64>;
}
