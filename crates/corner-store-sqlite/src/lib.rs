//! SQLite backend for the corner record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write that guards a once-only
//! transition runs inside a single `call`, so the check and the write cannot
//! interleave with another writer.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
