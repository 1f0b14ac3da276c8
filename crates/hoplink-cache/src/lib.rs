//! Cache-layer implementations for the Hoplink URL shortener.
//!
//! Both backends implement [`hoplink_core::UrlCache`]: a Moka in-memory
//! cache for single-node deployments and a Redis cache for shared
//! deployments. Entries are plain target-URL strings with a per-entry
//! TTL supplied by the caller.

pub mod moka;
pub mod redis;

pub use self::moka::MokaUrlCache;
pub use self::redis::RedisUrlCache;
