//! Query evaluation over the inverted index

use crate::crawler::parse_html;
use crate::lemma::Lemmatizer;
use crate::search::snippet::{build_snippet, query_terms};
use crate::storage::{LemmaRecord, SiteRecord, Storage, StorageError};
use crate::url::canonicalize;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Page size used when a request does not set a limit
pub const DEFAULT_LIMIT: usize = 20;

/// Errors returned by a search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Empty search query")]
    EmptyQuery,

    #[error("Site {0} is not indexed")]
    UnknownSite(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// One matching page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Site root without its trailing slash
    pub site: String,
    pub site_name: String,
    /// Page path relative to the site root
    pub uri: String,
    pub title: String,
    pub snippet: String,
    pub relevance: f64,
}

/// A query with optional site filter and paging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub site: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            site: None,
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Serialisable outcome of a search request
///
/// `count` is the number of matches before paging; `data` holds one page of
/// them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub count: usize,
    pub data: Vec<SearchResult>,
}

impl SearchResponse {
    /// Builds a response from search results, keeping `limit` of them from
    /// `offset` on
    pub fn paged(
        results: Result<Vec<SearchResult>, SearchError>,
        offset: usize,
        limit: usize,
    ) -> Self {
        match results {
            Ok(results) => Self {
                result: true,
                error: None,
                count: results.len(),
                data: results.into_iter().skip(offset).take(limit).collect(),
            },
            Err(e) => Self {
                result: false,
                error: Some(e.to_string()),
                count: 0,
                data: Vec::new(),
            },
        }
    }
}

/// Answers queries against the stored index
pub struct SearchEngine {
    storage: Arc<dyn Storage>,
    lemmatizer: Arc<Lemmatizer>,
}

impl SearchEngine {
    pub fn new(storage: Arc<dyn Storage>, lemmatizer: Arc<Lemmatizer>) -> Self {
        Self {
            storage,
            lemmatizer,
        }
    }

    /// Runs a request and pages its results
    pub fn execute(&self, request: &SearchRequest) -> SearchResponse {
        let results = self.search(&request.query, request.site.as_deref());
        SearchResponse::paged(results, request.offset, request.limit)
    }

    /// Finds the pages that contain every lemma of the query
    ///
    /// Searches one site when `site` is given, otherwise every stored site.
    /// Results are ordered by relevance, highest first; equal relevance keeps
    /// the order in which pages were found.
    pub fn search(
        &self,
        query: &str,
        site: Option<&str>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let sites = match site {
            Some(url) => {
                let url = canonicalize(url);
                match self.storage.find_site_by_url(&url)? {
                    Some(site) => vec![site],
                    None => return Err(SearchError::UnknownSite(url)),
                }
            }
            None => self.storage.find_all_sites()?,
        };

        let lemmas = self.lemmatizer.lemma_set(query);
        let terms = query_terms(query, &self.lemmatizer);

        let mut results = Vec::new();
        for site in &sites {
            results.extend(self.search_site(site, &lemmas, &terms)?);
        }

        results.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

        info!(
            "Query {:?} matched {} pages across {} sites",
            query,
            results.len(),
            sites.len()
        );
        Ok(results)
    }

    fn search_site(
        &self,
        site: &SiteRecord,
        lemmas: &HashSet<String>,
        terms: &[String],
    ) -> Result<Vec<SearchResult>, SearchError> {
        let mut records: Vec<LemmaRecord> = Vec::with_capacity(lemmas.len());
        for lemma in lemmas {
            if let Some(record) = self.storage.find_lemma_by_text_and_site(lemma, site.id)? {
                records.push(record);
            }
        }

        if records.is_empty() {
            debug!("No query lemma is known to {}", site.url);
            return Ok(Vec::new());
        }

        records.sort_by(|a, b| a.frequency.cmp(&b.frequency).then_with(|| a.lemma.cmp(&b.lemma)));

        let page_ids = self.matching_pages(&records)?;
        let lemma_ids: Vec<i64> = records.iter().map(|r| r.id).collect();

        let mut results = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            let Some(page) = self.storage.find_page_by_id(page_id)? else {
                continue;
            };

            let relevance = self
                .storage
                .find_ranks_for_page_and_lemmas(page_id, &lemma_ids)?
                .into_iter()
                .sum();

            let parsed = parse_html(&page.content);
            results.push(SearchResult {
                site: site.url.trim_end_matches('/').to_string(),
                site_name: site.name.clone(),
                uri: page.path,
                title: parsed.title.clone().unwrap_or_default(),
                snippet: build_snippet(&parsed, terms),
                relevance,
            });
        }

        debug!("{} pages of {} match", results.len(), site.url);
        Ok(results)
    }

    /// Pages holding every lemma, in the posting order of the first one
    fn matching_pages(&self, records: &[LemmaRecord]) -> Result<Vec<i64>, SearchError> {
        let Some((first, rest)) = records.split_first() else {
            return Ok(Vec::new());
        };

        let mut pages: Vec<i64> = self
            .storage
            .find_all_postings_by_lemma(first.id)?
            .into_iter()
            .map(|p| p.page_id)
            .collect();

        for record in rest {
            if pages.is_empty() {
                break;
            }
            let other: HashSet<i64> = self
                .storage
                .find_all_postings_by_lemma(record.id)?
                .into_iter()
                .map(|p| p.page_id)
                .collect();
            pages.retain(|id| other.contains(id));
        }

        Ok(pages)
    }
}
