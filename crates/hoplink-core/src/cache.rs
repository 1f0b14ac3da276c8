use crate::error::CacheError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use std::time::Duration;

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A volatile cache mapping short codes to target URLs.
///
/// Entries carry a TTL no greater than the remaining lifetime of the
/// corresponding durable record (see [`cache_ttl`]). Implementations can
/// use Redis, in-memory caches, or other backends.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get the cached target URL for a short code.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Store a target URL with the given TTL.
    ///
    /// Concurrent writes for the same code are idempotent overwrites.
    async fn set(&self, code: &ShortCode, target_url: &str, ttl: Duration) -> Result<()>;

    /// Remove a cached entry.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> Result<()>;
}

/// Computes the TTL for a cache entry.
///
/// Returns the configured default ceiling for records without an
/// expiration, the remaining lifetime when shorter than the ceiling, and
/// `None` when the record is already expired (the entry must not be
/// written).
pub fn cache_ttl(
    default_ttl: Duration,
    expires_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<Duration> {
    let Some(expires_at) = expires_at else {
        return Some(default_ttl);
    };

    let remaining = expires_at.duration_since(now);
    if remaining.is_negative() || remaining.is_zero() {
        return None;
    }

    let remaining = Duration::try_from(remaining).ok()?;
    Some(remaining.min(default_ttl))
}
