//! Core types and trait definitions for the nanoworks task marketplace.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod notification;
pub mod payment;
pub mod store;
pub mod submission;
pub mod task;
pub mod user;
pub mod withdrawal;

pub use error::{Error, Result};
