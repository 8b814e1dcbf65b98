//! Page cache for Linked Connections responses.
//!
//! Pages are immutable once published, so they are memoized by URL. Backward
//! and forward scans of overlapping windows, and repeated queries, share the
//! same fetched pages.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use super::convert::ConvertedPage;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached pages.
    pub ttl: Duration,

    /// Maximum number of cached pages.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 2000,
        }
    }
}

/// Cache of converted pages keyed by URL.
///
/// Cloning is cheap and clones share storage.
#[derive(Clone)]
pub struct PageCache {
    pages: MokaCache<String, Arc<ConvertedPage>>,
}

impl PageCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let pages = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { pages }
    }

    /// Get a cached page.
    pub async fn get(&self, url: &str) -> Option<Arc<ConvertedPage>> {
        self.pages.get(url).await
    }

    /// Insert a page into the cache.
    pub async fn insert(&self, url: String, page: Arc<ConvertedPage>) {
        self.pages.insert(url, page).await;
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.pages.entry_count()
    }

    /// Invalidate all cached pages.
    pub fn invalidate_all(&self) {
        self.pages.invalidate_all();
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("entries", &self.pages.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.max_capacity, 2000);
    }

    #[tokio::test]
    async fn cache_insert_and_get() {
        let cache = PageCache::new(&CacheConfig::default());
        assert!(cache.get("https://lc.example/p1").await.is_none());

        let page = Arc::new(ConvertedPage {
            next: Some("https://lc.example/p2".to_string()),
            ..Default::default()
        });
        cache.insert("https://lc.example/p1".to_string(), page).await;

        let hit = cache.get("https://lc.example/p1").await.unwrap();
        assert_eq!(hit.next.as_deref(), Some("https://lc.example/p2"));
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let cache = PageCache::new(&CacheConfig::default());
        let other = cache.clone();
        cache
            .insert("u".to_string(), Arc::new(ConvertedPage::default()))
            .await;
        assert!(other.get("u").await.is_some());

        other.invalidate_all();
        assert!(cache.get("u").await.is_none());
    }
}
