use anyhow::{Context, Result};
use tracing::info;

use crate::fetcher::{self, PageFetcher};
use crate::parser::listing::{self, Strategy};
use crate::records::Kind;

/// Where a kind's names are listed, and how that page is laid out.
pub struct Category {
    pub path: &'static str,
    pub strategy: Strategy,
    /// Upper bound on names taken from the listing.
    pub cap: Option<usize>,
}

pub fn category(kind: Kind) -> Category {
    match kind {
        Kind::Episode => Category {
            path: "/wiki/List_of_Animated_Media",
            strategy: Strategy::TableLinks,
            cap: None,
        },
        Kind::Jutsu => Category {
            path: "/wiki/Special:BrowseData/Jutsu?limit=1000&offset=0&_cat=Jutsu&Media=Manga",
            strategy: Strategy::ColumnList,
            cap: Some(400),
        },
        Kind::Character => Category {
            path: "/wiki/Special:BrowseData/Characters?limit=1000&offset=0&_cat=Characters",
            strategy: Strategy::ColumnList,
            cap: None,
        },
        Kind::Clan => Category {
            path: "/wiki/Special:BrowseData/Clans?limit=500&offset=0&_cat=Clans",
            strategy: Strategy::ColumnList,
            cap: None,
        },
    }
}

pub fn listing_url(base: &str, kind: Kind) -> String {
    format!("{}{}", base.trim_end_matches('/'), category(kind).path)
}

/// Fetch a kind's listing page and return `(article url, name)` pairs in listing order.
pub async fn fetch_names<F: PageFetcher + ?Sized>(
    fetcher: &F,
    base: &str,
    kind: Kind,
) -> Result<Vec<(String, String)>> {
    let url = listing_url(base, kind);
    info!("Fetching {} listing: {}", kind, url);
    let markup = fetcher
        .fetch(&url)
        .await
        .with_context(|| format!("Failed to fetch {} listing", kind))?;

    let cat = category(kind);
    let mut names = listing::extract_names(&markup, cat.strategy);
    info!("{} names on {} listing", names.len(), kind);
    if let Some(cap) = cat.cap {
        names.truncate(cap);
    }

    Ok(names
        .into_iter()
        .map(|name| (fetcher::article_url(base, &name), name))
        .collect())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::FetchError;

    struct OnePage(String);

    #[async_trait]
    impl PageFetcher for OnePage {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if url.contains("BrowseData/Jutsu") {
                Ok(self.0.clone())
            } else {
                Err(FetchError::Http { status: 404, retriable: false })
            }
        }
    }

    #[tokio::test]
    async fn jutsu_listing_is_capped_and_mapped_to_articles() {
        let items: String = (0..450).map(|i| format!("<li>Jutsu {i}</li>")).collect();
        let html = format!(r#"<div class="smw-columnlist-container"><ul>{items}</ul></div>"#);
        let pairs = fetch_names(&OnePage(html), "https://naruto.fandom.com", Kind::Jutsu)
            .await
            .unwrap();
        assert_eq!(pairs.len(), 400);
        assert_eq!(
            pairs[0],
            (
                "https://naruto.fandom.com/wiki/Jutsu%200".to_string(),
                "Jutsu 0".to_string()
            )
        );
        assert_eq!(pairs[399].1, "Jutsu 399");
    }

    #[tokio::test]
    async fn unreachable_listing_is_an_error() {
        let result = fetch_names(&OnePage(String::new()), "https://naruto.fandom.com", Kind::Clan).await;
        assert!(result.is_err());
    }

    #[test]
    fn listing_urls() {
        assert_eq!(
            listing_url("https://naruto.fandom.com/", Kind::Episode),
            "https://naruto.fandom.com/wiki/List_of_Animated_Media"
        );
        assert_eq!(category(Kind::Episode).strategy, Strategy::TableLinks);
        assert_eq!(category(Kind::Clan).strategy, Strategy::ColumnList);
    }
}
