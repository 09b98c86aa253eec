//! URL handling module for lemmadex
//!
//! This module provides URL canonicalization and the crawl scope rules:
//! which links a site crawl follows and how a page's stored path is derived.

mod canonical;
mod scope;

// Re-export main functions
pub use canonical::canonicalize;
pub use scope::{is_in_scope, owning_root, site_path};
