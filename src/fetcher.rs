use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use crate::config::Settings;
use crate::error::FetchError;

/// Characters `encodeURIComponent` leaves untouched.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Anything that can turn a URL into page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Article URL for an entity name on the wiki at `base`.
pub fn article_url(base: &str, name: &str) -> String {
    format!(
        "{}/wiki/{}",
        base.trim_end_matches('/'),
        utf8_percent_encode(name, COMPONENT)
    )
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(settings.request_timeout())
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::from_reqwest_error)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}
