//! Domain models of the quote server.
//!
//! This module groups the core types that sit behind the transport adapter:
//! - `quote_generator` — periodic `QuoteBatch` source with an injected random generator.
//! - `subscriber` — per-connection bounded delivery queues and the overflow policy.
//! - `coordinator` — the broadcast loop that owns the live subscriber set.

pub mod coordinator;
pub mod quote_generator;
pub mod subscriber;
