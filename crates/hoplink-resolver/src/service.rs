use hoplink_core::{cache_ttl, ClickQueue, ShortCode, StorageError, UrlCache, UrlStore};
use jiff::Timestamp;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Configures the resolution service.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ResolverConfig {
    /// Ceiling for cache-entry TTLs. Records with a nearer expiration
    /// get the remaining lifetime instead.
    #[builder(default = Duration::from_secs(3600))]
    pub default_cache_ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Service for resolving short codes to target URLs.
///
/// Composes the durable store, the cache layer, and the click queue.
/// All three are explicit injected dependencies; nothing here touches
/// process-wide state.
#[derive(Debug, Clone)]
pub struct ResolverService<S, C, Q> {
    store: Arc<S>,
    cache: Arc<C>,
    clicks: Q,
    config: ResolverConfig,
}

impl<S, C, Q> ResolverService<S, C, Q>
where
    S: UrlStore,
    C: UrlCache,
    Q: ClickQueue,
{
    /// Creates a new resolver with the default configuration.
    pub fn new(store: Arc<S>, cache: Arc<C>, clicks: Q) -> Self {
        Self::with_config(store, cache, clicks, ResolverConfig::default())
    }

    /// Creates a new resolver with a custom configuration.
    pub fn with_config(store: Arc<S>, cache: Arc<C>, clicks: Q, config: ResolverConfig) -> Self {
        Self {
            store,
            cache,
            clicks,
            config,
        }
    }

    /// Resolves a short code to its target URL.
    ///
    /// Returns `Ok(None)` if the code is unknown or its record has
    /// expired. A cache hit dispatches a click and returns immediately;
    /// a miss falls back to the store, enforces expiration, repopulates
    /// the cache with a TTL capped at the record's remaining lifetime,
    /// and dispatches a click. Cache failures are logged and suppressed.
    pub async fn resolve(&self, code: &ShortCode) -> Result<Option<String>, StorageError> {
        trace!(code = %code, "resolving short code");

        match self.cache.get(code).await {
            Ok(Some(target_url)) => {
                debug!(code = %code, "resolved from cache");
                self.clicks.enqueue(code);
                return Ok(Some(target_url));
            }
            Ok(None) => {
                trace!(code = %code, "cache miss, falling back to store");
            }
            Err(e) => {
                warn!(code = %code, error = %e, "cache read failed, falling back to store");
            }
        }

        let Some(record) = self.store.find_by_code(code).await? else {
            trace!(code = %code, "short code not found");
            return Ok(None);
        };

        let now = Timestamp::now();
        if record.is_expired_at(now) {
            debug!(code = %code, "record has expired");
            // A stale cache entry may still exist from before the deadline.
            if let Err(e) = self.cache.del(code).await {
                warn!(code = %code, error = %e, "failed to evict stale cache entry");
            }
            return Ok(None);
        }

        if let Some(ttl) = cache_ttl(self.config.default_cache_ttl, record.expires_at, now) {
            if let Err(e) = self.cache.set(code, &record.target_url, ttl).await {
                warn!(code = %code, error = %e, "failed to populate cache");
            }
        }

        self.clicks.enqueue(code);
        debug!(code = %code, url = %record.target_url, "resolved short code");
        Ok(Some(record.target_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoplink_cache::MokaUrlCache;
    use hoplink_core::{NewUrlRecord, NullQueue, OwnerId};
    use hoplink_storage::InMemoryStore;
    use jiff::SignedDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn owner() -> OwnerId {
        OwnerId::new("64b0c7a19f1e4a2b3c4d5e6f").unwrap()
    }

    fn new_record(c: &str, expires_at: Option<Timestamp>) -> NewUrlRecord {
        NewUrlRecord {
            short_code: code(c),
            target_url: "https://example.com".to_string(),
            owner_id: owner(),
            expires_at,
        }
    }

    #[derive(Default)]
    struct CountingQueue {
        dispatched: AtomicUsize,
    }

    #[derive(Clone)]
    struct SharedQueue(Arc<CountingQueue>);

    impl ClickQueue for SharedQueue {
        fn enqueue(&self, _code: &ShortCode) {
            self.0.dispatched.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FailingCache;

    #[async_trait::async_trait]
    impl UrlCache for FailingCache {
        async fn get(&self, _code: &ShortCode) -> hoplink_core::cache::Result<Option<String>> {
            Err(hoplink_core::CacheError::Unavailable("down".to_string()))
        }

        async fn set(
            &self,
            _code: &ShortCode,
            _target_url: &str,
            _ttl: Duration,
        ) -> hoplink_core::cache::Result<()> {
            Err(hoplink_core::CacheError::Unavailable("down".to_string()))
        }

        async fn del(&self, _code: &ShortCode) -> hoplink_core::cache::Result<()> {
            Err(hoplink_core::CacheError::Unavailable("down".to_string()))
        }
    }

    async fn service_with_record(
        c: &str,
        expires_at: Option<Timestamp>,
    ) -> ResolverService<InMemoryStore, MokaUrlCache, NullQueue> {
        let store = Arc::new(InMemoryStore::new());
        store.insert(new_record(c, expires_at)).await.unwrap();
        ResolverService::new(store, Arc::new(MokaUrlCache::new()), NullQueue)
    }

    #[tokio::test]
    async fn resolve_existing_code() {
        let service = service_with_record("abc123", None).await;

        let target = service.resolve(&code("abc123")).await.unwrap();
        assert_eq!(target.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn resolve_nonexistent_code() {
        let store = Arc::new(InMemoryStore::new());
        let service = ResolverService::new(store, Arc::new(MokaUrlCache::new()), NullQueue);

        assert!(service.resolve(&code("nope1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolve_expired_code() {
        let expired = Timestamp::now() - SignedDuration::from_secs(1);
        let service = service_with_record("abc123", Some(expired)).await;

        assert!(service.resolve(&code("abc123")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolve_not_yet_expired() {
        let future = Timestamp::now() + SignedDuration::from_hours(1);
        let service = service_with_record("abc123", Some(future)).await;

        let target = service.resolve(&code("abc123")).await.unwrap();
        assert_eq!(target.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn miss_populates_cache() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(new_record("abc123", None)).await.unwrap();
        let cache = Arc::new(MokaUrlCache::new());
        let service = ResolverService::new(store, Arc::clone(&cache), NullQueue);

        service.resolve(&code("abc123")).await.unwrap();

        assert_eq!(
            cache.get(&code("abc123")).await.unwrap().as_deref(),
            Some("https://example.com")
        );
    }

    /// Always misses on reads and counts evictions.
    #[derive(Default)]
    struct MissingCache {
        evictions: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl UrlCache for MissingCache {
        async fn get(&self, _code: &ShortCode) -> hoplink_core::cache::Result<Option<String>> {
            Ok(None)
        }

        async fn set(
            &self,
            _code: &ShortCode,
            _target_url: &str,
            _ttl: Duration,
        ) -> hoplink_core::cache::Result<()> {
            Ok(())
        }

        async fn del(&self, _code: &ShortCode) -> hoplink_core::cache::Result<()> {
            self.evictions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn expired_record_proactively_evicts_cache() {
        let store = Arc::new(InMemoryStore::new());
        let expired = Timestamp::now() - SignedDuration::from_secs(1);
        store
            .insert(new_record("abc123", Some(expired)))
            .await
            .unwrap();

        let cache = Arc::new(MissingCache::default());
        let service = ResolverService::new(store, Arc::clone(&cache), NullQueue);

        assert!(service.resolve(&code("abc123")).await.unwrap().is_none());
        assert_eq!(cache.evictions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_hit_skips_the_store() {
        // A record only present in the cache still resolves.
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(MokaUrlCache::new());
        cache
            .set(&code("abc123"), "https://cached.example", Duration::from_secs(60))
            .await
            .unwrap();

        let service = ResolverService::new(store, Arc::clone(&cache), NullQueue);
        let target = service.resolve(&code("abc123")).await.unwrap();
        assert_eq!(target.as_deref(), Some("https://cached.example"));
    }

    #[tokio::test]
    async fn clicks_dispatch_on_hit_and_miss() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(new_record("abc123", None)).await.unwrap();
        let queue = Arc::new(CountingQueue::default());
        let service = ResolverService::new(
            store,
            Arc::new(MokaUrlCache::new()),
            SharedQueue(Arc::clone(&queue)),
        );

        // First resolve misses the cache, second hits it.
        service.resolve(&code("abc123")).await.unwrap();
        service.resolve(&code("abc123")).await.unwrap();

        assert_eq!(queue.dispatched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_code_dispatches_no_click() {
        let store = Arc::new(InMemoryStore::new());
        let queue = Arc::new(CountingQueue::default());
        let service = ResolverService::new(
            store,
            Arc::new(MokaUrlCache::new()),
            SharedQueue(Arc::clone(&queue)),
        );

        service.resolve(&code("nope1")).await.unwrap();

        assert_eq!(queue.dispatched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn degraded_cache_never_fails_resolution() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(new_record("abc123", None)).await.unwrap();
        let service = ResolverService::new(store, Arc::new(FailingCache), NullQueue);

        let target = service.resolve(&code("abc123")).await.unwrap();
        assert_eq!(target.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn short_lived_record_gets_capped_ttl() {
        // Remaining lifetime shorter than the default ceiling still
        // produces a usable entry.
        let store = Arc::new(InMemoryStore::new());
        let expires = Timestamp::now() + SignedDuration::from_secs(30);
        store
            .insert(new_record("abc123", Some(expires)))
            .await
            .unwrap();
        let cache = Arc::new(MokaUrlCache::new());
        let service = ResolverService::new(store, Arc::clone(&cache), NullQueue);

        service.resolve(&code("abc123")).await.unwrap();

        assert!(cache.get(&code("abc123")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn concurrent_resolves_converge() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(new_record("abc123", None)).await.unwrap();
        let cache = Arc::new(MokaUrlCache::new());
        let service = Arc::new(ResolverService::new(
            store,
            Arc::clone(&cache),
            NullQueue,
        ));

        let mut handles = vec![];
        for _ in 0..10 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.resolve(&code("abc123")).await.unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(
                handle.await.unwrap().as_deref(),
                Some("https://example.com")
            );
        }

        assert_eq!(
            cache.get(&code("abc123")).await.unwrap().as_deref(),
            Some("https://example.com")
        );
    }
}
