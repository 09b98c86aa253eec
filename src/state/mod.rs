//! State module for tracking crawl progress
//!
//! This module provides the lifecycle state of each configured site.
//!
//! # Components
//!
//! - `SiteStatus`: Tracks whether a site is being indexed, indexed, or failed

mod site_status;

// Re-export main types
pub use site_status::SiteStatus;
