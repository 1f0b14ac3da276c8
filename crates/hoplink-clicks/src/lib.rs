//! Asynchronous click recording for the Hoplink URL shortener.
//!
//! The [`ClickRecorder`] runs a background worker decoupled from the
//! resolution request path: resolution enqueues a click and returns
//! immediately, and the worker applies the event to the durable store
//! out of band. Delivery is at-least-once; duplicates inflate the
//! derived totals and are accepted.

pub mod recorder;

pub use recorder::{ClickRecorder, RecorderQueue};
