//! Recursive crawl of one site
//!
//! Every URL is handled by its own task: it takes a permit from the site's
//! pool, fetches and indexes the page, releases the permit, then spawns one
//! child task per new in-scope link and joins them in URL order. A parent
//! never holds a permit while it waits for its children.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::indexer::Indexer;
use crate::state::SiteStatus;
use crate::storage::{SiteRecord, Storage};
use crate::url::{canonicalize, is_in_scope, site_path};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// URLs already claimed by some task of one crawl
///
/// A URL is claimed when it is discovered, before it is fetched, so two
/// branches that find the same link never both follow it.
#[derive(Debug, Default)]
pub struct DiscoveredUrls {
    urls: Mutex<HashSet<String>>,
}

impl DiscoveredUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a URL; returns false if it was already claimed
    pub fn insert(&self, url: String) -> bool {
        self.urls.lock().insert(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.lock().is_empty()
    }
}

/// Crawls one site from its root
pub struct SiteCrawler {
    site: Mutex<SiteRecord>,
    root: String,
    discovered: DiscoveredUrls,
    pool: Arc<Semaphore>,
    cancelled: Arc<AtomicBool>,
    fetcher: Arc<dyn PageFetcher>,
    indexer: Arc<Indexer>,
    storage: Arc<dyn Storage>,
}

impl SiteCrawler {
    /// Creates a crawler for a saved site whose url is its canonical root
    pub fn new(
        site: SiteRecord,
        pool: Arc<Semaphore>,
        cancelled: Arc<AtomicBool>,
        fetcher: Arc<dyn PageFetcher>,
        indexer: Arc<Indexer>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let root = site.url.clone();
        Self {
            site: Mutex::new(site),
            root,
            discovered: DiscoveredUrls::new(),
            pool,
            cancelled,
            fetcher,
            indexer,
            storage,
        }
    }

    /// Snapshot of the site record as this crawler last wrote it
    pub fn site(&self) -> SiteRecord {
        self.site.lock().clone()
    }

    pub fn discovered(&self) -> &DiscoveredUrls {
        &self.discovered
    }

    /// Crawls the whole site and settles its final status
    ///
    /// A site that saw no failure becomes INDEXED. A cancelled crawl leaves
    /// the status alone for the coordinator to settle.
    pub async fn run(self: Arc<Self>) {
        info!("Crawling {}", self.root);

        self.discovered.insert(self.root.clone());
        self.clone().crawl_url(self.root.clone()).await;

        if self.cancelled.load(Ordering::SeqCst) {
            info!(
                "Crawl of {} cancelled after {} URLs",
                self.root,
                self.discovered.len()
            );
            return;
        }

        let mut site = self.site.lock();
        if site.status != SiteStatus::Failed {
            site.status = SiteStatus::Indexed;
            site.status_time = Utc::now();
            if let Err(e) = self.storage.save_site(&site) {
                error!("Failed to mark {} as indexed: {}", self.root, e);
                return;
            }
        }

        info!(
            "Finished {} with status {} ({} URLs)",
            self.root,
            site.status,
            self.discovered.len()
        );
    }

    fn crawl_url(self: Arc<Self>, url: String) -> BoxFuture<'static, ()> {
        async move {
            let Some(path) = site_path(&self.root, &url) else {
                warn!("{} is outside {}", url, self.root);
                return;
            };

            let links = {
                let Ok(_permit) = self.pool.clone().acquire_owned().await else {
                    debug!("Pool for {} closed, skipping {}", self.root, url);
                    return;
                };

                let page = match self.fetcher.fetch(&url).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!("Failed to fetch {}: {}", url, e);
                        self.mark_failed(e.to_string());
                        return;
                    }
                };

                match self.indexer.add_page(self.site_id(), &path, &page) {
                    Ok(_) => self.touch(),
                    Err(e) => {
                        error!("Failed to index {}: {}", url, e);
                        self.mark_failed(format!("StorageError: {}", e));
                        return;
                    }
                }

                page.links
            };

            let mut children = Vec::new();
            for link in links {
                if self.cancelled.load(Ordering::SeqCst) {
                    break;
                }

                let link = canonicalize(&link);
                if is_in_scope(&self.root, &link) && self.discovered.insert(link.clone()) {
                    children.push(link);
                }
            }

            children.sort();

            let mut handles = Vec::with_capacity(children.len());
            for child in children {
                if self.cancelled.load(Ordering::SeqCst) {
                    break;
                }
                let task = tokio::spawn(self.clone().crawl_url(child.clone()));
                handles.push((child, task));
            }

            for (child, task) in handles {
                if let Err(e) = task.await {
                    error!("Crawl task for {} panicked: {}", child, e);
                }
            }
        }
        .boxed()
    }

    fn site_id(&self) -> i64 {
        self.site.lock().id
    }

    /// Records activity on the site
    fn touch(&self) {
        let mut site = self.site.lock();
        site.status_time = Utc::now();
        if let Err(e) = self.storage.save_site(&site) {
            warn!("Failed to update status time of {}: {}", self.root, e);
        }
    }

    fn mark_failed(&self, message: String) {
        let mut site = self.site.lock();
        site.status = SiteStatus::Failed;
        site.status_time = Utc::now();
        site.last_error = Some(message);
        if let Err(e) = self.storage.save_site(&site) {
            error!("Failed to mark {} as failed: {}", self.root, e);
        }
    }
}
