//! Linked Connections HTTP client.
//!
//! Fetches JSON-LD pages, converts them to domain connections and memoizes
//! them in a [`PageCache`]. A semaphore bounds concurrent requests.

use std::sync::Arc;

use chrono::SecondsFormat;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::connections::SourceError;
use crate::domain::Timestamp;

use super::cache::{CacheConfig, PageCache};
use super::convert::{ConvertedPage, convert_page};
use super::types::LinkedConnectionsPage;

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the Linked Connections client.
#[derive(Debug, Clone)]
pub struct LinkedConnectionsConfig {
    /// Connections endpoint, e.g. `https://graph.irail.be/sncb/connections`
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Page cache settings
    pub cache: CacheConfig,
}

impl LinkedConnectionsConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
            cache: CacheConfig::default(),
        }
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set page cache settings.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Something that can resolve page URLs to converted pages.
///
/// Implemented by [`LinkedConnectionsClient`]; tests substitute an
/// in-memory page map.
pub trait PageFetcher {
    /// URL of the page containing departures at `departure_time`.
    fn first_page_url(&self, departure_time: Timestamp) -> Result<String, SourceError>;

    /// Fetch and convert a page.
    async fn fetch_page(&self, url: &str) -> Result<Arc<ConvertedPage>, SourceError>;
}

/// Linked Connections API client.
///
/// Cloning is cheap; clones share the HTTP pool, the request semaphore and
/// the page cache.
#[derive(Debug, Clone)]
pub struct LinkedConnectionsClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
    cache: PageCache,
}

impl LinkedConnectionsClient {
    pub fn new(config: LinkedConnectionsConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/ld+json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            cache: PageCache::new(&config.cache),
        })
    }

    /// The underlying page cache.
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    async fn fetch_uncached(&self, url: &str) -> Result<ConvertedPage, SourceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SourceError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let page: LinkedConnectionsPage =
            serde_json::from_str(&body).map_err(|e| SourceError::Json {
                message: e.to_string(),
            })?;

        Ok(convert_page(&page))
    }
}

impl PageFetcher for LinkedConnectionsClient {
    fn first_page_url(&self, departure_time: Timestamp) -> Result<String, SourceError> {
        let time = departure_time.to_datetime().ok_or_else(|| {
            SourceError::InvalidWindow(format!("{departure_time:?} is not a finite time"))
        })?;
        let url = reqwest::Url::parse_with_params(
            &self.base_url,
            &[(
                "departureTime",
                time.to_rfc3339_opts(SecondsFormat::Millis, true),
            )],
        )
        .map_err(|e| SourceError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        Ok(url.into())
    }

    async fn fetch_page(&self, url: &str) -> Result<Arc<ConvertedPage>, SourceError> {
        if let Some(page) = self.cache.get(url).await {
            debug!(url, "page cache hit");
            return Ok(page);
        }

        debug!(url, "fetching page");
        let page = Arc::new(self.fetch_uncached(url).await?);
        self.cache.insert(url.to_string(), Arc::clone(&page)).await;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = LinkedConnectionsConfig::new("https://lc.example/connections")
            .with_max_concurrent(2)
            .with_timeout(5);
        assert_eq!(config.base_url, "https://lc.example/connections");
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn first_page_url_carries_departure_time() {
        let client =
            LinkedConnectionsClient::new(LinkedConnectionsConfig::new("https://lc.example/connections"))
                .unwrap();
        let time = Timestamp::parse_rfc3339("2024-03-15T08:00:00Z").unwrap();

        let url = client.first_page_url(time).unwrap();
        assert_eq!(
            url,
            "https://lc.example/connections?departureTime=2024-03-15T08%3A00%3A00.000Z"
        );
    }

    #[test]
    fn first_page_url_rejects_infinity() {
        let client =
            LinkedConnectionsClient::new(LinkedConnectionsConfig::new("https://lc.example/connections"))
                .unwrap();
        assert!(matches!(
            client.first_page_url(Timestamp::INFINITY),
            Err(SourceError::InvalidWindow(_))
        ));
    }

    #[test]
    fn first_page_url_rejects_bad_base() {
        let client =
            LinkedConnectionsClient::new(LinkedConnectionsConfig::new("not a url")).unwrap();
        let time = Timestamp::from_unix_seconds(0);
        assert!(matches!(
            client.first_page_url(time),
            Err(SourceError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn cached_pages_skip_the_network() {
        let client =
            LinkedConnectionsClient::new(LinkedConnectionsConfig::new("http://127.0.0.1:9/connections"))
                .unwrap();
        let url = "http://127.0.0.1:9/connections?departureTime=x";
        client
            .cache()
            .insert(url.to_string(), Arc::new(ConvertedPage::default()))
            .await;

        let page = client.fetch_page(url).await.unwrap();
        assert!(page.connections.is_empty());
    }
}
