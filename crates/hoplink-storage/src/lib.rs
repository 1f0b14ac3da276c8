//! Durable-store implementations for the Hoplink URL shortener.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;
