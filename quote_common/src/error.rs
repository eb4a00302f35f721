//! Error types shared between client and server.
//!
//! The `QuoteError` enum unifies common failure cases for I/O, serialization,
//! WebSocket transport, channel communication and configuration, allowing
//! crates to propagate a single error type.
use std::io;

use thiserror::Error;

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// I/O error originating from the standard library or sockets/files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// WebSocket protocol or transport failure after the handshake.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The WebSocket opening handshake failed.
    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    /// HTTP server or upgraded-socket failure reported by the server framework.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Invalid command-line or environment configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl<T> From<crossbeam_channel::SendError<T>> for QuoteError {
    fn from(err: crossbeam_channel::SendError<T>) -> Self {
        QuoteError::ChannelSend(err.to_string())
    }
}
