use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::records::{Kind, Record};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id         INTEGER PRIMARY KEY,
            kind       TEXT NOT NULL,
            name       TEXT NOT NULL,
            url        TEXT NOT NULL,
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(kind, name)
        );
        CREATE INDEX IF NOT EXISTS idx_pages_visited ON pages(visited);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            kind       TEXT NOT NULL,
            name       TEXT NOT NULL,
            url        TEXT NOT NULL,
            html       TEXT,
            error      TEXT,
            latency_ms INTEGER,
            scraped_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_name ON page_data(kind, name);

        -- One JSON document per record
        CREATE TABLE IF NOT EXISTS documents (
            kind       TEXT NOT NULL,
            name       TEXT NOT NULL,
            doc        TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (kind, name)
        );
        ",
    )?;
    Ok(())
}

// ── Queue ──

/// Queue `(url, name)` pairs. Names that already have a document, or are already queued, are skipped.
pub fn insert_pages(conn: &Connection, kind: Kind, pages: &[(String, String)]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO pages (kind, name, url)
             SELECT ?1, ?2, ?3
             WHERE NOT EXISTS (SELECT 1 FROM documents WHERE kind = ?1 AND name = ?2)",
        )?;
        for (url, name) in pages {
            count += stmt.execute(rusqlite::params![kind, name, url])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

#[derive(Debug, Clone)]
pub struct PendingPage {
    pub page_id: i64,
    pub kind: Kind,
    pub name: String,
    pub url: String,
}

pub fn fetch_unvisited(conn: &Connection, limit: Option<usize>) -> Result<Vec<PendingPage>> {
    let sql = format!(
        "SELECT id, kind, name, url FROM pages WHERE visited = 0 ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingPage {
                page_id: row.get(0)?,
                kind: row.get(1)?,
                name: row.get(2)?,
                url: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ScrapeRow {
    pub page_id: i64,
    pub kind: Kind,
    pub name: String,
    pub url: String,
    pub html: Option<String>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
    pub scraped_at: String,
}

/// Put pages whose fetch failed back in the queue.
pub fn requeue_failed(conn: &Connection) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let count = tx.execute(
        "UPDATE pages SET visited = 0, visited_at = NULL
         WHERE id IN (SELECT page_id FROM page_data WHERE error IS NOT NULL)",
        [],
    )?;
    tx.execute("DELETE FROM page_data WHERE error IS NOT NULL", [])?;
    tx.commit()?;
    Ok(count)
}

// ── Processing ──

pub struct ScrapedPage {
    pub page_data_id: i64,
    pub kind: Kind,
    pub name: String,
    pub html: String,
}

/// Fetched pages with no document yet.
pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<ScrapedPage>> {
    let sql = format!(
        "SELECT pd.id, pd.kind, pd.name, pd.html
         FROM page_data pd
         LEFT JOIN documents d ON d.kind = pd.kind AND d.name = pd.name
         WHERE pd.html IS NOT NULL AND d.name IS NULL
         ORDER BY pd.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ScrapedPage {
                page_data_id: row.get(0)?,
                kind: row.get(1)?,
                name: row.get(2)?,
                html: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Drop the markup of pages that could not be parsed and keep the reason as a fetch error,
/// so they leave the processing queue and `requeue_failed` picks them up.
pub fn mark_unparsable(conn: &Connection, failures: &[(i64, String)]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("UPDATE page_data SET html = NULL, error = ?2 WHERE id = ?1")?;
        for (page_data_id, reason) in failures {
            count += stmt.execute(rusqlite::params![page_data_id, reason])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Documents ──

pub fn record_exists(conn: &Connection, kind: Kind, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM documents WHERE kind = ?1 AND name = ?2",
            rusqlite::params![kind, name],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Insert records; a name that already has a document keeps it. Returns the kinds actually inserted.
pub fn save_records(conn: &Connection, records: &[Record]) -> Result<Vec<Kind>> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = Vec::new();
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO documents (kind, name, doc) VALUES (?1, ?2, ?3)",
        )?;
        for r in records {
            let doc = r
                .to_json()
                .with_context(|| format!("Failed to encode {} {}", r.kind(), r.name()))?;
            if stmt.execute(rusqlite::params![r.kind(), r.name(), doc])? > 0 {
                inserted.push(r.kind());
            }
        }
    }
    tx.commit()?;
    Ok(inserted)
}

pub fn fetch_document(conn: &Connection, kind: Kind, name: &str) -> Result<Option<serde_json::Value>> {
    let doc: Option<String> = conn
        .query_row(
            "SELECT doc FROM documents WHERE kind = ?1 AND name = ?2",
            rusqlite::params![kind, name],
            |row| row.get(0),
        )
        .optional()?;
    doc.map(|d| serde_json::from_str(&d).context("Stored document is not valid JSON"))
        .transpose()
}

// ── Stats ──

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub queued: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub scraped: usize,
    pub errors: usize,
    pub documents: usize,
}

pub fn get_stats(conn: &Connection, kind: Kind) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> {
        Ok(conn.query_row(sql, rusqlite::params![kind], |r| r.get(0))?)
    };
    let queued = count("SELECT COUNT(*) FROM pages WHERE kind = ?1")?;
    let visited = count("SELECT COUNT(*) FROM pages WHERE kind = ?1 AND visited = 1")?;
    let scraped = count("SELECT COUNT(*) FROM page_data WHERE kind = ?1 AND html IS NOT NULL")?;
    let errors = count("SELECT COUNT(*) FROM page_data WHERE kind = ?1 AND error IS NOT NULL")?;
    let documents = count("SELECT COUNT(*) FROM documents WHERE kind = ?1")?;
    Ok(Stats {
        queued,
        visited,
        unvisited: queued - visited,
        scraped,
        errors,
        documents,
    })
}

#[cfg(test)]
pub(crate) fn memory() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    conn
}
