//! Core types and trait definitions for the Stemma genealogical tree model.
//!
//! This crate is deliberately free of HTTP and runtime dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod date;
pub mod error;
pub mod person;
pub mod raw;
pub mod richness;
pub mod source;

pub use error::{Error, Result};
pub use person::PersonId;
