//! Crawl coordinator - lifecycle of all site crawls
//!
//! This module owns the registry of running site crawls and implements the
//! entry points exposed to callers:
//! - `start`: re-crawl every configured site from scratch
//! - `stop`: cancel running crawls and settle site statuses
//! - `index_one_page`: fetch and (re)index a single page
//!
//! Each site gets one worker task with its own pool of permits. Stopping
//! closes the pools, raises the shared cancellation flag and awaits every
//! worker's join handle.

use crate::config::SiteEntry;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::indexer::Indexer;
use crate::crawler::site_crawler::SiteCrawler;
use crate::lemma::Lemmatizer;
use crate::state::SiteStatus;
use crate::storage::{SiteRecord, Storage, StorageError};
use crate::url::{canonicalize, is_in_scope, owning_root, site_path};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Stored as `last_error` of every site a stop interrupts
pub const STOPPED_BY_USER: &str = "Indexing stopped by user";

/// Errors returned by the coordinator's entry points
#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("Indexing is already running")]
    AlreadyRunning,

    #[error("Indexing is not running")]
    NotRunning,

    #[error("Page {0} is outside the sites listed in the configuration")]
    OutOfScope(String),

    #[error("{0}")]
    Network(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of a start, stop or single-page request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexingResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), IndexingError>> for IndexingResponse {
    fn from(result: Result<(), IndexingError>) -> Self {
        match result {
            Ok(()) => Self {
                result: true,
                error: None,
            },
            Err(e) => Self {
                result: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// A running (or finished) site crawl
struct SiteWorker {
    root: String,
    handle: JoinHandle<()>,
    pool: Arc<Semaphore>,
}

/// Counts one live worker until dropped
struct ActiveGuard(Arc<watch::Sender<usize>>);

impl ActiveGuard {
    fn new(active: Arc<watch::Sender<usize>>) -> Self {
        active.send_modify(|count| *count += 1);
        Self(active)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.send_modify(|count| *count = count.saturating_sub(1));
    }
}

/// Main coordinator structure
pub struct Coordinator {
    sites: Vec<SiteEntry>,
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn PageFetcher>,
    indexer: Arc<Indexer>,
    pool_size: usize,
    cancelled: Arc<AtomicBool>,
    workers: Mutex<Vec<SiteWorker>>,
    active: Arc<watch::Sender<usize>>,
}

impl Coordinator {
    /// Creates a coordinator for the configured sites
    ///
    /// # Arguments
    ///
    /// * `sites` - Configured site roots, in config order
    /// * `storage` - Shared storage backend
    /// * `fetcher` - Page fetcher used by every crawl
    /// * `lemmatizer` - Shared lemmatizer for the indexer
    pub fn new(
        sites: Vec<SiteEntry>,
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn PageFetcher>,
        lemmatizer: Arc<Lemmatizer>,
    ) -> Self {
        let indexer = Arc::new(Indexer::new(storage.clone(), lemmatizer));
        let (active, _) = watch::channel(0usize);

        Self {
            sites,
            storage,
            fetcher,
            indexer,
            pool_size: num_cpus::get(),
            cancelled: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
            active: Arc::new(active),
        }
    }

    /// Sets the number of permits in each site's pool
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Starts a fresh crawl of every configured site
    ///
    /// Each site's previous row and data are deleted and a new INDEXING row
    /// is saved before any worker is spawned. If a storage call fails, the
    /// rows saved so far are marked FAILED and no crawl starts.
    pub async fn start(&self) -> Result<(), IndexingError> {
        let mut workers = self.workers.lock().await;
        if self.is_running() {
            return Err(IndexingError::AlreadyRunning);
        }

        workers.clear();
        self.cancelled.store(false, Ordering::SeqCst);

        let mut sites = Vec::with_capacity(self.sites.len());
        for entry in &self.sites {
            match self.reset_site(entry) {
                Ok(site) => sites.push(site),
                Err(e) => {
                    error!("Failed to prepare {}: {}", entry.url, e);
                    self.abandon(sites, &e);
                    return Err(e.into());
                }
            }
        }

        for site in sites {
            let root = site.url.clone();
            let pool = Arc::new(Semaphore::new(self.pool_size));
            let crawler = Arc::new(SiteCrawler::new(
                site,
                pool.clone(),
                self.cancelled.clone(),
                self.fetcher.clone(),
                self.indexer.clone(),
                self.storage.clone(),
            ));

            let guard = ActiveGuard::new(self.active.clone());
            let handle = tokio::spawn(async move {
                let _guard = guard;
                crawler.run().await;
            });

            workers.push(SiteWorker { root, handle, pool });
        }

        info!(
            "Started indexing {} sites with {} permits each",
            workers.len(),
            self.pool_size
        );
        Ok(())
    }

    /// Deletes a site's previous index and saves a fresh INDEXING row
    fn reset_site(&self, entry: &SiteEntry) -> Result<SiteRecord, StorageError> {
        let root = canonicalize(&entry.url);

        while let Some(previous) = self.storage.find_site_by_url(&root)? {
            info!("Deleting previous index of {}", root);
            self.storage.delete_site(previous.id)?;
        }

        let mut site = SiteRecord::new(root, entry.name.clone(), SiteStatus::Indexing);
        site.id = self.storage.save_site(&site)?;
        Ok(site)
    }

    /// Marks sites prepared by a start that failed before any crawl began
    fn abandon(&self, sites: Vec<SiteRecord>, cause: &StorageError) {
        for mut site in sites {
            site.status = SiteStatus::Failed;
            site.status_time = Utc::now();
            site.last_error = Some(format!("StorageError: {}", cause));
            if let Err(e) = self.storage.save_site(&site) {
                error!("Failed to mark {} as failed: {}", site.url, e);
            }
        }
    }

    /// Stops every running crawl
    ///
    /// Returns once every worker has finished. Sites that did not reach
    /// INDEXED are then marked FAILED with [`STOPPED_BY_USER`].
    pub async fn stop(&self) -> Result<(), IndexingError> {
        let mut workers = self.workers.lock().await;
        if !self.is_running() {
            return Err(IndexingError::NotRunning);
        }

        info!("Stopping {} site crawls", workers.len());

        for worker in workers.iter() {
            worker.pool.close();
        }
        self.cancelled.store(true, Ordering::SeqCst);

        for worker in workers.drain(..) {
            if let Err(e) = worker.handle.await {
                error!("Worker for {} panicked: {}", worker.root, e);
            }
        }

        self.cancelled.store(false, Ordering::SeqCst);

        for mut site in self.storage.find_all_sites()? {
            if site.status == SiteStatus::Indexed {
                continue;
            }
            site.status = SiteStatus::Failed;
            site.status_time = Utc::now();
            site.last_error = Some(STOPPED_BY_USER.to_string());
            self.storage.save_site(&site)?;
            warn!("{} stopped before it was fully indexed", site.url);
        }

        Ok(())
    }

    /// Fetches and indexes a single page without following its links
    ///
    /// The page must fall under a configured root; the longest matching root
    /// owns it. A stored page with the same path is replaced along with its
    /// lemma contributions.
    pub async fn index_one_page(&self, url: &str) -> Result<(), IndexingError> {
        let workers = self.workers.lock().await;
        if self.is_running() {
            return Err(IndexingError::AlreadyRunning);
        }

        let url = canonicalize(url);
        let roots: Vec<String> = self.sites.iter().map(|s| canonicalize(&s.url)).collect();

        let root = owning_root(roots.iter().map(String::as_str), &url)
            .filter(|root| is_in_scope(root, &url))
            .ok_or_else(|| IndexingError::OutOfScope(url.clone()))?
            .to_string();
        let path = site_path(&root, &url).ok_or_else(|| IndexingError::OutOfScope(url.clone()))?;

        let mut site = match self.storage.find_site_by_url(&root)? {
            Some(site) => site,
            None => {
                let name = self
                    .sites
                    .iter()
                    .find(|s| canonicalize(&s.url) == root)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                let mut site = SiteRecord::new(root.clone(), name, SiteStatus::Indexed);
                site.id = self.storage.save_site(&site)?;
                site
            }
        };

        let page = self.fetcher.fetch(&url).await?;
        self.indexer.add_or_update_page(site.id, &path, &page)?;

        site.status_time = Utc::now();
        self.storage.save_site(&site)?;

        drop(workers);
        info!("Indexed single page {}", url);
        Ok(())
    }

    /// Returns true while any site crawl is still working
    pub fn is_running(&self) -> bool {
        *self.active.borrow() > 0
    }

    /// Resolves once no site crawl is running
    pub async fn wait_idle(&self) {
        let mut rx = self.active.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}
