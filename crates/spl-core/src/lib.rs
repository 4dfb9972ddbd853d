//! Core types and collaborator traits for the access-notification service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store, the upstream clients, and the notification transport all
//! implement traits defined here; the reconciliation engine only ever sees
//! those traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod dispatch;
pub mod error;
pub mod notification;
pub mod store;
pub mod tracked;
pub mod upstream;

pub use error::{Error, Result};
