use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

const ENV_PREFIX: &str = "SHINOBI";

/// Runtime settings: built-in defaults overlaid by `SHINOBI_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    pub wiki_base: String,
    pub concurrency: usize,
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_config(Config::builder().add_source(
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        ))
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings = builder
            .set_default("db_path", "data/shinobi.sqlite")?
            .set_default("wiki_base", "https://naruto.fandom.com")?
            .set_default("concurrency", 4_i64)?
            .set_default("max_retries", 3_i64)?
            .set_default("base_backoff_ms", 2000_i64)?
            .set_default("request_timeout_secs", 30_i64)?
            .set_default("user_agent", "shinobi_scraper/0.1")?
            .build()
            .context("Failed to build settings")?
            .try_deserialize::<Settings>()
            .context("Invalid settings")?;
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            concurrency: self.concurrency.max(1),
            max_retries: self.max_retries,
            base_backoff: Duration::from_millis(self.base_backoff_ms),
        }
    }
}

/// Fetch pacing used by the scrape phase.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub concurrency: usize,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt.min(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        let s = Settings::from_config(Config::builder()).unwrap();
        assert_eq!(s.db_path, PathBuf::from("data/shinobi.sqlite"));
        assert_eq!(s.wiki_base, "https://naruto.fandom.com");
        assert_eq!(s.concurrency, 4);
        assert_eq!(s.max_retries, 3);
        assert_eq!(s.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let builder = Config::builder()
            .set_override("concurrency", 9_i64)
            .unwrap()
            .set_override("wiki_base", "http://localhost:8080")
            .unwrap();
        let s = Settings::from_config(builder).unwrap();
        assert_eq!(s.concurrency, 9);
        assert_eq!(s.wiki_base, "http://localhost:8080");
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            concurrency: 1,
            max_retries: 3,
            base_backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
    }
}
