//! Core types and traits for the Hoplink URL shortener.
//!
//! This crate provides the shared data model, the port traits for the
//! durable store, the cache layer, and the click queue, and the error
//! types used by the shortener and resolver services.

pub mod cache;
pub mod clicks;
pub mod error;
pub mod owner;
pub mod record;
pub mod shortcode;
pub mod store;

pub use cache::{cache_ttl, UrlCache};
pub use clicks::{ClickQueue, NullQueue};
pub use error::{CacheError, CoreError, StorageError};
pub use owner::OwnerId;
pub use record::{ClickEvent, NewUrlRecord, UrlAnalytics, UrlRecord};
pub use shortcode::ShortCode;
pub use store::UrlStore;
