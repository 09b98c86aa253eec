//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the lemmadex database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per configured site root
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    name TEXT NOT NULL,
    status TEXT NOT NULL,
    status_time TEXT NOT NULL,
    last_error TEXT
);

CREATE INDEX IF NOT EXISTS idx_sites_url ON sites(url);

-- Fetched pages, keyed by path within their site
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    path TEXT NOT NULL,
    code INTEGER NOT NULL,
    content TEXT NOT NULL,
    UNIQUE(site_id, path)
);

CREATE INDEX IF NOT EXISTS idx_pages_site ON pages(site_id);

-- Lemmas per site with the number of pages containing them
CREATE TABLE IF NOT EXISTS lemmas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    lemma TEXT NOT NULL,
    frequency INTEGER NOT NULL,
    UNIQUE(site_id, lemma)
);

CREATE INDEX IF NOT EXISTS idx_lemmas_site ON lemmas(site_id);

-- Inverted index postings
CREATE TABLE IF NOT EXISTS postings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id),
    lemma_id INTEGER NOT NULL REFERENCES lemmas(id),
    lemma_rank REAL NOT NULL,
    UNIQUE(page_id, lemma_id)
);

CREATE INDEX IF NOT EXISTS idx_postings_page ON postings(page_id);
CREATE INDEX IF NOT EXISTS idx_postings_lemma ON postings(lemma_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
