//! Ownership and CRUD service for the Hoplink URL shortener.
//!
//! [`ShortenService`] creates, lists, and deletes shortened URLs scoped
//! to an owning user, and derives on-demand analytics from the
//! click-event log. Creation write-through populates the cache;
//! deletion evicts it.

pub mod error;
pub mod service;

pub use error::ShortenError;
pub use service::{CreateParams, ShortenConfig, ShortenService};
