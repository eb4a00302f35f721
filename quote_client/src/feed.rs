//! Receiving quote batches from the server's WebSocket stream.
//!
//! Every text frame is expected to hold one JSON-encoded `QuoteBatch`. Frames that
//! do not decode are logged and skipped; the filter is applied locally.
use log::{debug, info};
use quote_common::quote::batch_from_json;
use quote_common::{Instrument, Quote, QuoteError, Result};
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tungstenite::error::ProtocolError;
use tungstenite::{Message, WebSocket};

/// Set of instruments the user asked to see.
#[derive(Debug, Clone, Default)]
pub struct QuoteFilter {
    names: Vec<String>,
}

impl QuoteFilter {
    /// Filter keeping `instruments`; an empty list keeps everything.
    pub fn new(instruments: &[Instrument]) -> Self {
        Self {
            names: instruments.iter().map(|i| i.to_string()).collect(),
        }
    }

    /// Whether `quote` should be shown.
    pub fn accepts(&self, quote: &Quote) -> bool {
        self.names.is_empty() || self.names.iter().any(|n| n == &quote.name)
    }

    /// Decode one text frame and keep the accepted quotes, in batch order.
    pub fn select(&self, text: &str) -> Result<Vec<Quote>, QuoteError> {
        let batch = batch_from_json(text)?;
        Ok(batch.into_iter().filter(|q| self.accepts(q)).collect())
    }
}

/// Read frames from `socket` and log the accepted quotes until the server
/// closes the stream or `shutdown` is set.
///
/// The underlying stream should have a read timeout so `shutdown` is observed.
pub fn start_receiver_loop<S: Read + Write>(
    socket: &mut WebSocket<S>,
    filter: &QuoteFilter,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    while !shutdown.load(Ordering::Relaxed) {
        match socket.read() {
            Ok(Message::Text(text)) => match filter.select(&text) {
                Ok(quotes) => {
                    for quote in quotes {
                        info!("QUOTE: {} Price={:.2}", quote.name, quote.price);
                    }
                }
                Err(_) => debug!("Received non-quote message: {}", text),
            },
            Ok(Message::Close(frame)) => {
                info!("Server closed the stream: {:?}", frame);
                return Ok(());
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake),
            ) => {
                info!("Connection to server lost");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
    info!("Receiver loop stopping...");
    let _ = socket.close(None);
    let _ = socket.flush();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"[{"Name":"Apple","Price":7.3},{"Name":"Microsoft","Price":300},{"Name":"HP","Price":12.5}]"#;

    #[test]
    fn empty_filter_keeps_whole_batch() {
        let quotes = QuoteFilter::default().select(BATCH).unwrap();
        assert_eq!(quotes.len(), 3);
    }

    #[test]
    fn filter_keeps_requested_instruments_in_order() {
        let filter = QuoteFilter::new(&[Instrument::Hp, Instrument::Apple]);
        let names: Vec<String> = filter
            .select(BATCH)
            .unwrap()
            .into_iter()
            .map(|q| q.name)
            .collect();
        assert_eq!(names, ["Apple", "HP"]);
    }

    #[test]
    fn non_quote_frame_is_an_error() {
        assert!(QuoteFilter::default().select("1 client(s) connected.").is_err());
    }
}
