//! Resolution service for the Hoplink URL shortener.
//!
//! [`ResolverService`] orchestrates the read path: cache lookup, store
//! fallback, expiration enforcement, read-through cache population, and
//! fire-and-forget click dispatch. Cache and click-queue degradation
//! never fails a resolution; only durable-store errors surface.

pub mod service;

pub use service::{ResolverConfig, ResolverService};
