use async_trait::async_trait;
use hoplink_core::cache::Result;
use hoplink_core::{ShortCode, UrlCache};
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// A cached target URL together with its requested lifetime.
#[derive(Debug, Clone)]
struct CachedTarget {
    target_url: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was inserted with. An overwrite
/// restarts the clock with the new value's TTL.
struct PerEntryTtl;

impl Expiry<String, CachedTarget> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedTarget,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedTarget,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// An in-memory cache implementation using Moka.
///
/// Ideal for single-node deployments or as a local cache in front of
/// Redis. Unlike a cache-wide time-to-live, every entry expires after
/// the TTL passed to `set`, which lets entries track the remaining
/// lifetime of their durable record.
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    cache: Cache<String, CachedTarget>,
}

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

impl MokaUrlCache {
    /// Creates a new Moka URL cache with default settings.
    ///
    /// The cache will have a default maximum capacity of 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    /// Creates a new Moka URL cache with a custom maximum capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
        trace!(code = %code, "fetching target from Moka cache");

        let key = code.as_str().to_string();
        match self.cache.get(&key).await {
            Some(entry) => {
                debug!(code = %code, "cache hit in Moka");
                Ok(Some(entry.target_url))
            }
            None => {
                trace!(code = %code, "cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set(&self, code: &ShortCode, target_url: &str, ttl: Duration) -> Result<()> {
        trace!(code = %code, ttl_secs = ttl.as_secs(), "storing target in Moka cache");

        let key = code.as_str().to_string();
        let entry = CachedTarget {
            target_url: target_url.to_string(),
            ttl,
        };
        self.cache.insert(key, entry).await;
        debug!(code = %code, "cached target in Moka");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        trace!(code = %code, "removing target from Moka cache");

        let key = code.as_str().to_string();
        self.cache.invalidate(&key).await;
        debug!(code = %code, "removed target from Moka cache (if present)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn cache_get_and_set() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");

        assert!(cache.get(&c).await.unwrap().is_none());

        cache.set(&c, "https://example.com", HOUR).await.unwrap();

        let result = cache.get(&c).await.unwrap();
        assert_eq!(result.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn cache_del_removes_entry() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");

        cache.set(&c, "https://example.com", HOUR).await.unwrap();
        assert!(cache.get(&c).await.unwrap().is_some());

        cache.del(&c).await.unwrap();

        assert!(cache.get(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cache_del_is_idempotent() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");

        cache.del(&c).await.unwrap();
        assert!(cache.get(&c).await.unwrap().is_none());
        cache.del(&c).await.unwrap();
    }

    #[tokio::test]
    async fn entries_expire_after_their_own_ttl() {
        let cache = MokaUrlCache::new();
        let short = code("abc123");
        let long = code("def456");

        cache
            .set(&short, "https://short.example", Duration::from_millis(50))
            .await
            .unwrap();
        cache.set(&long, "https://long.example", HOUR).await.unwrap();

        assert!(cache.get(&short).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get(&short).await.unwrap().is_none());
        assert!(cache.get(&long).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overwrite_applies_the_new_ttl() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");

        cache.set(&c, "https://example.com", HOUR).await.unwrap();
        cache
            .set(&c, "https://example.com", Duration::from_millis(50))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        // The second set's shorter TTL wins over the hour left on the first.
        assert!(cache.get(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overwrite_is_idempotent() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");

        cache.set(&c, "https://example.com", HOUR).await.unwrap();
        cache.set(&c, "https://example.com", HOUR).await.unwrap();

        assert_eq!(
            cache.get(&c).await.unwrap().as_deref(),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn cache_handles_many_entries() {
        let cache = MokaUrlCache::with_capacity(100);

        for i in 0..50 {
            let c = code(&format!("code{:02}", i));
            cache
                .set(&c, &format!("https://example{}.com", i), HOUR)
                .await
                .unwrap();
        }

        assert_eq!(
            cache.get(&code("code00")).await.unwrap().as_deref(),
            Some("https://example0.com")
        );
        assert_eq!(
            cache.get(&code("code25")).await.unwrap().as_deref(),
            Some("https://example25.com")
        );
    }
}
