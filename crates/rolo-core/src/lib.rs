//! Core types and trait definitions for the rolo contact service.
//!
//! This crate is deliberately free of HTTP dependencies. The storage
//! backends and the API layer depend on it; it depends on nothing in the
//! workspace.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod error;
pub mod key;
pub mod store;

pub use error::{Error, Result};
