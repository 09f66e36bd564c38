mod config;
mod crawl;
mod db;
mod error;
mod fetcher;
mod listing;
mod parser;
mod records;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Settings;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::records::Kind;

#[derive(Parser)]
#[command(name = "shinobi_scraper", about = "Narutopedia scraper: characters, jutsu, clans, episodes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch listing pages and queue entity names
    Init {
        /// Only this kind (default: all)
        #[arg(short, long, value_enum)]
        kind: Option<Kind>,
    },
    /// Fetch queued pages
    Scrape {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract records from fetched pages and store them
    Process {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Init + scrape + process
    Run {
        #[arg(short, long, value_enum)]
        kind: Option<Kind>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print the names on a listing page without touching the store
    Names {
        #[arg(short, long, value_enum)]
        kind: Kind,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print one record as JSON
    Show {
        #[arg(short, long, value_enum)]
        kind: Kind,
        name: String,
        /// Fetch and extract now instead of reading the store (nothing is saved)
        #[arg(long)]
        live: bool,
    },
    /// Re-queue pages whose fetch failed
    Retry,
    /// Show scraping statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Init { kind } => {
            let conn = open(&settings)?;
            let fetcher = HttpFetcher::new(&settings)?;
            let queued = init(&conn, &fetcher, &settings, kind).await?;
            println!("Queued {} new names", queued);
            Ok(())
        }
        Commands::Scrape { limit } => {
            let conn = open(&settings)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first or all pages are scraped.");
                return Ok(());
            }
            println!("Scraping {} pages (streaming to DB)...", pages.len());
            let fetcher = Arc::new(HttpFetcher::new(&settings)?);
            let stats =
                crawl::scrape_pages_streaming(&conn, fetcher, pages, settings.retry_policy())
                    .await?;
            println!(
                "Done: {} scraped ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = open(&settings)?;
            let pages = db::fetch_unprocessed(&conn, limit)?;
            if pages.is_empty() {
                println!("No unprocessed pages. Run 'scrape' first.");
                return Ok(());
            }
            println!("Processing {} pages...", pages.len());
            let counts = process_pages(&conn, &pages)?;
            counts.print();
            Ok(())
        }
        Commands::Run { kind, limit } => {
            let conn = open(&settings)?;
            let fetcher = Arc::new(HttpFetcher::new(&settings)?);

            // Phase 1: Queue
            let queued = init(&conn, fetcher.as_ref(), &settings, kind).await?;
            println!("Queued {} new names", queued);

            // Phase 2: Scrape (streaming to DB)
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages.");
            } else {
                let t_scrape = Instant::now();
                println!("Pipeline: scraping {} pages (streaming to DB)...", pages.len());
                let stats = crawl::scrape_pages_streaming(
                    &conn,
                    Arc::clone(&fetcher),
                    pages,
                    settings.retry_policy(),
                )
                .await?;
                println!(
                    "Scraped {} pages ({} ok, {} errors) in {:.1}s",
                    stats.total,
                    stats.ok,
                    stats.errors,
                    t_scrape.elapsed().as_secs_f64()
                );
            }

            // Phase 3: Process
            let t_process = Instant::now();
            let unprocessed = db::fetch_unprocessed(&conn, None)?;
            if unprocessed.is_empty() {
                println!("Nothing to process.");
                return Ok(());
            }
            println!("Processing {} pages...", unprocessed.len());
            let counts = process_pages(&conn, &unprocessed)?;
            println!("Processed in {:.1}s", t_process.elapsed().as_secs_f64());
            counts.print();
            Ok(())
        }
        Commands::Names { kind, limit } => {
            let fetcher = HttpFetcher::new(&settings)?;
            let pairs = listing::fetch_names(&fetcher, &settings.wiki_base, kind).await?;
            let shown = limit.unwrap_or(pairs.len());
            for (_, name) in pairs.iter().take(shown) {
                println!("{}", name);
            }
            println!("\n{} {} names", pairs.len(), kind);
            Ok(())
        }
        Commands::Show { kind, name, live } => {
            let doc = if live {
                let fetcher = HttpFetcher::new(&settings)?;
                let url = fetcher::article_url(&settings.wiki_base, &name);
                let html = fetcher
                    .fetch(&url)
                    .await
                    .with_context(|| format!("Failed to fetch {}", url))?;
                let record = parser::extract::assemble(kind, &name, &html)?;
                let conn = open(&settings)?;
                if db::record_exists(&conn, kind, &name)? {
                    info!("{} {:?} is already stored; the live copy is not saved", kind, name);
                }
                Some(serde_json::from_str::<serde_json::Value>(&record.to_json()?)?)
            } else {
                let conn = open(&settings)?;
                db::fetch_document(&conn, kind, &name)?
            };
            match doc {
                Some(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
                None => println!("No stored {} named {:?}. Try --live.", kind, name),
            }
            Ok(())
        }
        Commands::Retry => {
            let conn = open(&settings)?;
            let n = db::requeue_failed(&conn)?;
            println!("Re-queued {} failed pages", n);
            Ok(())
        }
        Commands::Stats => {
            let conn = open(&settings)?;
            println!(
                "{:<10} | {:>7} | {:>7} | {:>9} | {:>7} | {:>6} | {:>9}",
                "Kind", "Queued", "Visited", "Unvisited", "Scraped", "Errors", "Documents"
            );
            println!("{}", "-".repeat(74));
            for kind in Kind::ALL {
                let s = db::get_stats(&conn, kind)?;
                println!(
                    "{:<10} | {:>7} | {:>7} | {:>9} | {:>7} | {:>6} | {:>9}",
                    kind.as_str(),
                    s.queued,
                    s.visited,
                    s.unvisited,
                    s.scraped,
                    s.errors,
                    s.documents
                );
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn open(settings: &Settings) -> anyhow::Result<rusqlite::Connection> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    Ok(conn)
}

/// Queue listing names for `kind`, or for every kind. A failed listing is logged and skipped.
async fn init<F: PageFetcher + ?Sized>(
    conn: &rusqlite::Connection,
    fetcher: &F,
    settings: &Settings,
    kind: Option<Kind>,
) -> anyhow::Result<usize> {
    let kinds = match kind {
        Some(k) => vec![k],
        None => Kind::ALL.to_vec(),
    };
    let mut queued = 0;
    for kind in kinds {
        match listing::fetch_names(fetcher, &settings.wiki_base, kind).await {
            Ok(pairs) => {
                let inserted = db::insert_pages(conn, kind, &pairs)?;
                info!("Queued {} new {} names ({} listed)", inserted, kind, pairs.len());
                queued += inserted;
            }
            Err(e) => warn!("Skipping {} listing: {:#}", kind, e),
        }
    }
    Ok(queued)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ProcessCounts {
    characters: usize,
    jutsu: usize,
    clans: usize,
    episodes: usize,
    /// Assembled, but a document with that name was already stored.
    skipped: usize,
    failed: usize,
}

impl ProcessCounts {
    fn add(&mut self, kind: Kind) {
        match kind {
            Kind::Character => self.characters += 1,
            Kind::Jutsu => self.jutsu += 1,
            Kind::Clan => self.clans += 1,
            Kind::Episode => self.episodes += 1,
        }
    }

    fn print(&self) {
        println!(
            "Saved {} characters, {} jutsu, {} clans, {} episodes ({} already stored, {} failed).",
            self.characters, self.jutsu, self.clans, self.episodes, self.skipped, self.failed,
        );
    }
}

fn process_pages(
    conn: &rusqlite::Connection,
    pages: &[db::ScrapedPage],
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ProcessCounts::default();

    for chunk in pages.chunks(500) {
        let results: Vec<_> = chunk.par_iter().map(parser::process_page).collect();

        let mut records = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (page, result) in chunk.iter().zip(results) {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping {} {} (page_data {}): {}", page.kind, page.name, page.page_data_id, e);
                    failures.push((page.page_data_id, e.to_string()));
                }
            }
        }

        counts.failed += db::mark_unparsable(conn, &failures)?;
        let inserted = db::save_records(conn, &records)?;
        counts.skipped += records.len() - inserted.len();
        for kind in inserted {
            counts.add(kind);
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Jutsu, Record};

    fn scraped(id: i64, name: &str, html: &str) -> db::ScrapedPage {
        db::ScrapedPage {
            page_data_id: id,
            kind: Kind::Jutsu,
            name: name.into(),
            html: html.into(),
        }
    }

    #[test]
    fn counts_only_newly_stored_records() {
        let conn = db::memory();
        let stored = Record::Jutsu(Jutsu {
            name: "Chidori".into(),
            ..Default::default()
        });
        db::save_records(&conn, &[stored]).unwrap();

        let pages = [
            scraped(1, "Rasengan", "<p>Rasengan</p>"),
            scraped(2, "Chidori", "<p>Chidori</p>"),
        ];
        let counts = process_pages(&conn, &pages).unwrap();
        assert_eq!(
            counts,
            ProcessCounts {
                jutsu: 1,
                skipped: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn blank_pages_are_not_processed_twice() {
        let conn = db::memory();
        conn.execute(
            "INSERT INTO pages (id, kind, name, url, visited) VALUES (1, 'jutsu', 'Blank', 'https://wiki/Blank', 1)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO page_data (id, page_id, kind, name, url, html, scraped_at)
             VALUES (7, 1, 'jutsu', 'Blank', 'https://wiki/Blank', ' ', datetime('now'))",
            [],
        )
        .unwrap();

        let pages = db::fetch_unprocessed(&conn, None).unwrap();
        assert_eq!(pages.len(), 1);
        let counts = process_pages(&conn, &pages).unwrap();
        assert_eq!(counts.failed, 1);
        assert!(db::fetch_unprocessed(&conn, None).unwrap().is_empty());
    }
}
