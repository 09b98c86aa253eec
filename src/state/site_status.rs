/// Site status definitions for tracking crawl progress
///
/// Every configured site row carries one of these states. A fresh crawl
/// creates the row as `Indexing`; the crawl ends in `Indexed` or `Failed`.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a site's indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    /// A crawl of this site is in progress
    Indexing,

    /// The last crawl of this site completed without a fetch failure
    Indexed,

    /// A fetch failed during the crawl, or the crawl was stopped by the user
    Failed,
}

impl SiteStatus {
    /// Returns true if no crawl is working on the site any more
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Indexing)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
