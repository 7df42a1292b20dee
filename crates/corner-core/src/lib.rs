//! Core types and rules for the corner operations back-end.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the delivery temperature acceptance engine (category resolution, the
//! per-category tolerance table, the reception verdict), the showcase
//! shelf-life and alert helpers, the supply-request lifecycle, and the
//! [`store::CornerStore`] trait every backend implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod delivery;
pub mod error;
pub mod reception;
pub mod request;
pub mod rules;
pub mod showcase;
pub mod store;
pub mod temperature;

pub use error::{Error, Result};
