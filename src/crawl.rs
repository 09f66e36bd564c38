use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::RetryPolicy;
use crate::db::{PendingPage, ScrapeRow};
use crate::error::FetchError;
use crate::fetcher::PageFetcher;

/// Scrape stats returned after completion.
#[derive(Debug, PartialEq, Eq)]
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Fetch pages concurrently, saving each result to DB as it arrives.
/// A failed fetch is stored as an error row and never stops the batch.
pub async fn scrape_pages_streaming<F>(
    conn: &Connection,
    fetcher: Arc<F>,
    pages: Vec<PendingPage>,
    policy: RetryPolicy,
) -> Result<ScrapeStats>
where
    F: PageFetcher + 'static,
{
    let semaphore = Arc::new(Semaphore::new(policy.concurrency));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Workers send results, this task owns the connection and saves them.
    let (tx, mut rx) = tokio::sync::mpsc::channel::<ScrapeRow>(policy.concurrency * 2);

    for page in pages {
        let fetcher = Arc::clone(&fetcher);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let start = Instant::now();
            let result = fetch_with_retry(fetcher.as_ref(), &page, policy).await;
            let latency_ms = Some(start.elapsed().as_millis() as i64);

            let (html, error) = match result {
                Ok(html) => (Some(html), None),
                Err(e) => {
                    warn!("Fetch failed for {} {}: {}", page.kind, page.name, e);
                    (None, Some(e.to_string()))
                }
            };
            let _ = tx
                .send(ScrapeRow {
                    page_id: page.page_id,
                    kind: page.kind,
                    name: page.name,
                    url: page.url,
                    html,
                    error,
                    latency_ms,
                    scraped_at: chrono::Utc::now().to_rfc3339(),
                })
                .await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    let mut insert_stmt = conn.prepare(
        "INSERT INTO page_data (page_id, kind, name, url, html, error, latency_ms, scraped_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let mut update_stmt = conn.prepare(
        "UPDATE pages SET visited = 1, visited_at = datetime('now') WHERE id = ?1",
    )?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }
        save_one(&mut insert_stmt, &mut update_stmt, &row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Scraped {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(ScrapeStats { total, ok, errors })
}

fn save_one(
    insert: &mut rusqlite::Statement,
    update: &mut rusqlite::Statement,
    row: &ScrapeRow,
) -> Result<()> {
    insert.execute(rusqlite::params![
        row.page_id, row.kind, row.name, row.url, row.html, row.error, row.latency_ms, row.scraped_at,
    ])?;
    update.execute(rusqlite::params![row.page_id])?;
    Ok(())
}

async fn fetch_with_retry<F: PageFetcher + ?Sized>(
    fetcher: &F,
    page: &PendingPage,
    policy: RetryPolicy,
) -> Result<String, FetchError> {
    let mut attempt = 0;
    loop {
        match fetcher.fetch(&page.url).await {
            Ok(html) => return Ok(html),
            Err(e) if e.should_retry() && attempt < policy.max_retries => {
                let backoff = policy.backoff(attempt);
                warn!(
                    "{} on {} (attempt {}/{}), backing off {:.1}s",
                    e,
                    page.name,
                    attempt + 1,
                    policy.max_retries,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
