//! Page indexing
//!
//! The indexer persists fetched pages and maintains the inverted index:
//! lemma frequencies per site and one posting per (page, lemma) pair.
//!
//! Each page is handed to the storage backend as a single
//! [`Storage::index_page`] call, which applies the page row, the frequency
//! updates and the postings together or not at all. Page writes are also
//! serialized process-wide by a lock held by the shared `Indexer`.
//! Lemmatization is pure and runs before the lock is taken.

use crate::crawler::fetcher::FetchedPage;
use crate::crawler::parser::visible_text;
use crate::lemma::Lemmatizer;
use crate::storage::{PageRecord, Storage, StorageError, StorageResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// Pages with a status at or above this code carry no postings
const FIRST_ERROR_STATUS: u16 = 400;

/// Writes pages, lemmas and postings
pub struct Indexer {
    storage: Arc<dyn Storage>,
    lemmatizer: Arc<Lemmatizer>,
    write_lock: Mutex<()>,
}

impl Indexer {
    pub fn new(storage: Arc<dyn Storage>, lemmatizer: Arc<Lemmatizer>) -> Self {
        Self {
            storage,
            lemmatizer,
            write_lock: Mutex::new(()),
        }
    }

    /// Stores a page the site has not seen yet
    ///
    /// Returns `false` without writing anything when the path is already
    /// stored for the site.
    pub fn add_page(&self, site_id: i64, path: &str, page: &FetchedPage) -> StorageResult<bool> {
        let lemmas = self.lemmas_of(page);
        let record = page_record(site_id, path, page);

        let _guard = self.write_lock.lock();

        match self.storage.index_page(&record, &lemmas, false)? {
            Some(_) => {
                debug!("Indexed {} (status {})", path, page.status_code);
                Ok(true)
            }
            None => {
                trace!("Page {} already stored for site {}", path, site_id);
                Ok(false)
            }
        }
    }

    /// Stores a page, replacing the stored copy of the same path
    ///
    /// A replaced page first gives back everything it contributed: each of
    /// its postings decrements the lemma's frequency, lemmas left with no
    /// pages are deleted, and the postings themselves are removed. The new
    /// content is then indexed as if it were a fresh page.
    pub fn add_or_update_page(
        &self,
        site_id: i64,
        path: &str,
        page: &FetchedPage,
    ) -> StorageResult<PageRecord> {
        let lemmas = self.lemmas_of(page);
        let mut record = page_record(site_id, path, page);

        let _guard = self.write_lock.lock();

        record.id = self
            .storage
            .index_page(&record, &lemmas, true)?
            .ok_or_else(|| StorageError::Database(format!("Page {} was not replaced", path)))?;

        debug!("Re-indexed {} (status {})", path, page.status_code);
        Ok(record)
    }

    /// Sorted `(lemma, rank)` pairs of a page; error pages have none
    fn lemmas_of(&self, page: &FetchedPage) -> Vec<(String, f64)> {
        if page.status_code >= FIRST_ERROR_STATUS {
            return Vec::new();
        }

        let mut lemmas: Vec<(String, f64)> = self
            .lemmatizer
            .analyze(&visible_text(&page.content))
            .into_iter()
            .map(|(lemma, count)| (lemma, count as f64))
            .collect();
        lemmas.sort_by(|a, b| a.0.cmp(&b.0));
        lemmas
    }
}

fn page_record(site_id: i64, path: &str, page: &FetchedPage) -> PageRecord {
    PageRecord {
        id: 0,
        site_id,
        path: path.to_string(),
        code: page.status_code,
        content: page.content.clone(),
    }
}
