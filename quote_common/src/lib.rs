//!
//! Common types and utilities shared by the quote server and client.
//!
//! This crate aggregates:
//! - `error` — unified error type `QuoteError` used across the workspace.
//! - `result` — handy `Result<T, QuoteError>` alias.
//! - `instrument` — the named instruments quoted by the server.
//! - `quote` — the `Quote` payload and its JSON wire form.
//! - `net` — networking constants and small helpers.
#![warn(missing_docs)]
pub mod error;
pub mod instrument;
pub mod net;
pub mod quote;
pub mod result;

pub use error::QuoteError;
pub use instrument::Instrument;
pub use quote::{Quote, QuoteBatch};
pub use result::Result;
