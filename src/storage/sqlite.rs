//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{LemmaRecord, PageRecord, PostingRecord, SiteRecord};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";
const PAGE_COLUMNS: &str = "id, site_id, path, code, content";
const LEMMA_COLUMNS: &str = "id, site_id, lemma, frequency";
const POSTING_COLUMNS: &str = "id, page_id, lemma_id, lemma_rank";

/// SQLite storage backend
///
/// The connection sits behind a mutex, so one instance can be shared
/// through an `Arc<dyn Storage>`.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs raw SQL against the connection
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }
}

/// Gives back the frequency contributed by a page's postings, then drops them
fn retract_postings(tx: &Transaction<'_>, site_id: i64, page_id: i64) -> rusqlite::Result<()> {
    tx.execute(
        "UPDATE lemmas SET frequency = frequency - 1
         WHERE id IN (SELECT lemma_id FROM postings WHERE page_id = ?1)",
        params![page_id],
    )?;
    tx.execute("DELETE FROM postings WHERE page_id = ?1", params![page_id])?;
    tx.execute(
        "DELETE FROM lemmas WHERE site_id = ?1 AND frequency <= 0",
        params![site_id],
    )?;
    Ok(())
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    let status: String = row.get(3)?;
    let status_time: String = row.get(4)?;
    let status_time = DateTime::parse_from_rfc3339(&status_time)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&status).unwrap_or(SiteStatus::Failed),
        status_time,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

fn lemma_from_row(row: &Row<'_>) -> rusqlite::Result<LemmaRecord> {
    Ok(LemmaRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        lemma: row.get(2)?,
        frequency: row.get(3)?,
    })
}

fn posting_from_row(row: &Row<'_>) -> rusqlite::Result<PostingRecord> {
    Ok(PostingRecord {
        id: row.get(0)?,
        page_id: row.get(1)?,
        lemma_id: row.get(2)?,
        rank: row.get(3)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Sites =====

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let conn = self.conn.lock();
        let site = conn
            .query_row(
                &format!(
                    "SELECT {} FROM sites WHERE url = ?1 ORDER BY id LIMIT 1",
                    SITE_COLUMNS
                ),
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn save_site(&self, site: &SiteRecord) -> StorageResult<i64> {
        let conn = self.conn.lock();
        let status_time = site.status_time.to_rfc3339();

        if site.id == 0 {
            conn.execute(
                "INSERT INTO sites (url, name, status, status_time, last_error)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    site.url,
                    site.name,
                    site.status.to_db_string(),
                    status_time,
                    site.last_error
                ],
            )?;
            return Ok(conn.last_insert_rowid());
        }

        let updated = conn.execute(
            "UPDATE sites SET url = ?1, name = ?2, status = ?3, status_time = ?4, last_error = ?5
             WHERE id = ?6",
            params![
                site.url,
                site.name,
                site.status.to_db_string(),
                status_time,
                site.last_error,
                site.id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::SiteNotFound(site.id));
        }
        Ok(site.id)
    }

    fn delete_site(&self, site_id: i64) -> StorageResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM postings WHERE page_id IN (SELECT id FROM pages WHERE site_id = ?1)",
            params![site_id],
        )?;
        tx.execute(
            "DELETE FROM postings WHERE lemma_id IN (SELECT id FROM lemmas WHERE site_id = ?1)",
            params![site_id],
        )?;
        tx.execute("DELETE FROM lemmas WHERE site_id = ?1", params![site_id])?;
        tx.execute("DELETE FROM pages WHERE site_id = ?1", params![site_id])?;
        tx.execute("DELETE FROM sites WHERE id = ?1", params![site_id])?;

        tx.commit()?;
        Ok(())
    }

    fn find_all_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS))?;

        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sites)
    }

    // ===== Pages =====

    fn find_page_by_id(&self, page_id: i64) -> StorageResult<Option<PageRecord>> {
        let conn = self.conn.lock();
        let page = conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn find_page_by_path_and_site(
        &self,
        path: &str,
        site_id: i64,
    ) -> StorageResult<Option<PageRecord>> {
        let conn = self.conn.lock();
        let page = conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE path = ?1 AND site_id = ?2",
                    PAGE_COLUMNS
                ),
                params![path, site_id],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn save_page(&self, page: &PageRecord) -> StorageResult<i64> {
        let conn = self.conn.lock();

        if page.id == 0 {
            conn.execute(
                "INSERT INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
                params![page.site_id, page.path, page.code, page.content],
            )?;
            return Ok(conn.last_insert_rowid());
        }

        let updated = conn.execute(
            "UPDATE pages SET site_id = ?1, path = ?2, code = ?3, content = ?4 WHERE id = ?5",
            params![page.site_id, page.path, page.code, page.content, page.id],
        )?;

        if updated == 0 {
            return Err(StorageError::Database(format!("Page not found: {}", page.id)));
        }
        Ok(page.id)
    }

    fn find_all_pages_by_site(&self, site_id: i64) -> StorageResult<Vec<PageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pages WHERE site_id = ?1 ORDER BY id",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map(params![site_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn delete_all_pages_by_site(&self, site_id: i64) -> StorageResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM postings WHERE page_id IN (SELECT id FROM pages WHERE site_id = ?1)",
            params![site_id],
        )?;
        tx.execute("DELETE FROM pages WHERE site_id = ?1", params![site_id])?;

        tx.commit()?;
        Ok(())
    }

    fn count_pages_by_site(&self, site_id: i64) -> StorageResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Lemmas =====

    fn find_lemma_by_text_and_site(
        &self,
        lemma: &str,
        site_id: i64,
    ) -> StorageResult<Option<LemmaRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM lemmas WHERE lemma = ?1 AND site_id = ?2",
                    LEMMA_COLUMNS
                ),
                params![lemma, site_id],
                lemma_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn find_lemma_by_id(&self, lemma_id: i64) -> StorageResult<Option<LemmaRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!("SELECT {} FROM lemmas WHERE id = ?1", LEMMA_COLUMNS),
                params![lemma_id],
                lemma_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn save_lemma(&self, lemma: &LemmaRecord) -> StorageResult<i64> {
        let conn = self.conn.lock();

        if lemma.id == 0 {
            conn.execute(
                "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, ?3)",
                params![lemma.site_id, lemma.lemma, lemma.frequency],
            )?;
            return Ok(conn.last_insert_rowid());
        }

        let updated = conn.execute(
            "UPDATE lemmas SET site_id = ?1, lemma = ?2, frequency = ?3 WHERE id = ?4",
            params![lemma.site_id, lemma.lemma, lemma.frequency, lemma.id],
        )?;

        if updated == 0 {
            return Err(StorageError::LemmaNotFound(lemma.id));
        }
        Ok(lemma.id)
    }

    fn delete_lemma(&self, lemma_id: i64) -> StorageResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM postings WHERE lemma_id = ?1", params![lemma_id])?;
        tx.execute("DELETE FROM lemmas WHERE id = ?1", params![lemma_id])?;

        tx.commit()?;
        Ok(())
    }

    fn find_all_lemmas_by_site(&self, site_id: i64) -> StorageResult<Vec<LemmaRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM lemmas WHERE site_id = ?1 ORDER BY id",
            LEMMA_COLUMNS
        ))?;

        let lemmas = stmt
            .query_map(params![site_id], lemma_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lemmas)
    }

    fn delete_all_lemmas_by_site(&self, site_id: i64) -> StorageResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM postings WHERE lemma_id IN (SELECT id FROM lemmas WHERE site_id = ?1)",
            params![site_id],
        )?;
        tx.execute("DELETE FROM lemmas WHERE site_id = ?1", params![site_id])?;

        tx.commit()?;
        Ok(())
    }

    fn count_lemmas_by_site(&self, site_id: i64) -> StorageResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM lemmas WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Postings =====

    fn save_posting(&self, posting: &PostingRecord) -> StorageResult<i64> {
        let conn = self.conn.lock();

        if posting.id == 0 {
            conn.execute(
                "INSERT INTO postings (page_id, lemma_id, lemma_rank) VALUES (?1, ?2, ?3)",
                params![posting.page_id, posting.lemma_id, posting.rank],
            )?;
            return Ok(conn.last_insert_rowid());
        }

        let updated = conn.execute(
            "UPDATE postings SET page_id = ?1, lemma_id = ?2, lemma_rank = ?3 WHERE id = ?4",
            params![posting.page_id, posting.lemma_id, posting.rank, posting.id],
        )?;

        if updated == 0 {
            return Err(StorageError::Database(format!(
                "Posting not found: {}",
                posting.id
            )));
        }
        Ok(posting.id)
    }

    fn find_all_postings_by_lemma(&self, lemma_id: i64) -> StorageResult<Vec<PostingRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM postings WHERE lemma_id = ?1 ORDER BY id",
            POSTING_COLUMNS
        ))?;

        let postings = stmt
            .query_map(params![lemma_id], posting_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(postings)
    }

    fn find_all_postings_by_page(&self, page_id: i64) -> StorageResult<Vec<PostingRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM postings WHERE page_id = ?1 ORDER BY id",
            POSTING_COLUMNS
        ))?;

        let postings = stmt
            .query_map(params![page_id], posting_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(postings)
    }

    fn delete_all_postings_by_page(&self, page_id: i64) -> StorageResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM postings WHERE page_id = ?1", params![page_id])?;
        Ok(())
    }

    fn find_ranks_for_page_and_lemmas(
        &self,
        page_id: i64,
        lemma_ids: &[i64],
    ) -> StorageResult<Vec<f64>> {
        if lemma_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; lemma_ids.len()].join(", ");
        let query = format!(
            "SELECT lemma_rank FROM postings WHERE page_id = ? AND lemma_id IN ({})",
            placeholders
        );

        let mut values = Vec::with_capacity(lemma_ids.len() + 1);
        values.push(page_id);
        values.extend_from_slice(lemma_ids);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&query)?;
        let ranks = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get(0))?
            .collect::<Result<Vec<f64>, _>>()?;

        Ok(ranks)
    }

    // ===== Indexing =====

    fn index_page(
        &self,
        page: &PageRecord,
        lemmas: &[(String, f64)],
        replace: bool,
    ) -> StorageResult<Option<i64>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM pages WHERE site_id = ?1 AND path = ?2",
                params![page.site_id, page.path],
                |row| row.get(0),
            )
            .optional()?;

        let page_id = match existing {
            Some(_) if !replace => return Ok(None),
            Some(page_id) => {
                retract_postings(&tx, page.site_id, page_id)?;
                tx.execute(
                    "UPDATE pages SET code = ?1, content = ?2 WHERE id = ?3",
                    params![page.code, page.content, page_id],
                )?;
                page_id
            }
            None => {
                tx.execute(
                    "INSERT INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
                    params![page.site_id, page.path, page.code, page.content],
                )?;
                tx.last_insert_rowid()
            }
        };

        for (lemma, rank) in lemmas {
            tx.execute(
                "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, 1)
                 ON CONFLICT(site_id, lemma) DO UPDATE SET frequency = frequency + 1",
                params![page.site_id, lemma],
            )?;
            let lemma_id: i64 = tx.query_row(
                "SELECT id FROM lemmas WHERE site_id = ?1 AND lemma = ?2",
                params![page.site_id, lemma],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT INTO postings (page_id, lemma_id, lemma_rank) VALUES (?1, ?2, ?3)",
                params![page_id, lemma_id, rank],
            )?;
        }

        tx.commit()?;
        Ok(Some(page_id))
    }

    // ===== Statistics =====

    fn count_total_pages(&self) -> StorageResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_total_lemmas(&self) -> StorageResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM lemmas", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
