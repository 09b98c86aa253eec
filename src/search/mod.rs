//! Search module for answering queries
//!
//! A query is lemmatized the same way pages are. A page matches when it
//! holds every query lemma known to its site, and its relevance is the sum
//! of those lemmas' ranks on the page. Each match carries a snippet with
//! the query words highlighted.

mod engine;
mod snippet;

pub use engine::{
    SearchEngine, SearchError, SearchRequest, SearchResponse, SearchResult, DEFAULT_LIMIT,
};
pub use snippet::{build_snippet, mark_bold, query_terms, SEPARATOR, SNIPPET_BUDGET};
