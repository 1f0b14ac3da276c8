use async_trait::async_trait;
use hoplink_core::cache::Result;
use hoplink_core::{CacheError, ShortCode, UrlCache};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A Redis-based implementation of [`UrlCache`].
///
/// Stores the bare target URL as a string value under a configurable
/// key prefix, with the entry TTL applied via `SET ... EX`.
#[derive(Clone)]
pub struct RedisUrlCache {
    conn: redis::aio::ConnectionManager,
    key_prefix: String,
}

impl std::fmt::Debug for RedisUrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisUrlCache")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

const DEFAULT_KEY_PREFIX: &str = "hop:url:";

impl RedisUrlCache {
    /// Creates a new Redis URL cache.
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Creates a new Redis URL cache with a custom key prefix.
    pub fn with_prefix(conn: redis::aio::ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Generates the cache key for a short code.
    fn cache_key(&self, code: &ShortCode) -> String {
        format!("{}{}", self.key_prefix, code.as_str())
    }
}

fn map_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_timeout() {
        CacheError::Timeout(err.to_string())
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        CacheError::Unavailable(err.to_string())
    } else {
        CacheError::Operation(err.to_string())
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
        let key = self.cache_key(code);
        trace!(code = %code, "fetching target from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(target_url)) => {
                debug!(code = %code, "cache hit in Redis");
                Ok(Some(target_url))
            }
            Ok(None) => {
                trace!(code = %code, "cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(code = %code, error = %e, "Redis error on get");
                Err(map_redis_error(e))
            }
        }
    }

    async fn set(&self, code: &ShortCode, target_url: &str, ttl: Duration) -> Result<()> {
        let key = self.cache_key(code);
        trace!(code = %code, ttl_secs = ttl.as_secs(), "storing target in Redis cache");

        // SETEX rejects a zero expiry; sub-second TTLs round up to 1s.
        let ttl_secs = ttl.as_secs().max(1);

        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(&key, target_url, ttl_secs).await {
            Ok(()) => {
                debug!(code = %code, "cached target in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(code = %code, error = %e, "failed to cache target in Redis");
                Err(map_redis_error(e))
            }
        }
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        let key = self.cache_key(code);
        trace!(code = %code, "removing target from Redis cache");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&key).await {
            Ok(()) => {
                debug!(code = %code, "removed target from Redis cache");
                Ok(())
            }
            Err(e) => {
                warn!(code = %code, error = %e, "failed to remove target from Redis cache");
                Err(map_redis_error(e))
            }
        }
    }
}
