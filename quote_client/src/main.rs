//! Quote Client — a WebSocket client that subscribes to the quote server's stream and
//! logs every received quote. It connects to `ws://<server-ip>:<port>/status`, decodes
//! each text frame as a batch of quotes and prints the instruments selected with `--only`.
//!
//! Usage example (CLI):
//! ```bash
//! quote_client --server-ip 192.168.0.10 --port 5000 --only apple --only google
//! ```
#![warn(missing_docs)]
mod args;
mod feed;

use crate::args::Args;
use crate::feed::{QuoteFilter, start_receiver_loop};
use clap::Parser;
use log::info;
use quote_common::QuoteError;
use quote_common::Result;
use quote_common::net::{addr, status_url};
use std::net::TcpStream;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

/// How often the receiver loop wakes up to check for Ctrl+C.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

fn main() -> Result<(), QuoteError> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| QuoteError::Config(format!("Error setting Ctrl+C handler: {}", e)))?;
    }

    let server_ip = args.server_ip.trim().replace('"', "");
    let url = status_url(&server_ip, args.port);
    info!("Connecting to {}", url);

    let stream = TcpStream::connect(addr(&server_ip, args.port))?;
    let (mut socket, _response) =
        tungstenite::client(url, stream).map_err(|e| QuoteError::Handshake(e.to_string()))?;
    socket.get_ref().set_read_timeout(Some(READ_TIMEOUT))?;

    let filter = QuoteFilter::new(&args.only);
    info!("Client is running. Press Ctrl+C to exit.");
    start_receiver_loop(&mut socket, &filter, shutdown)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
