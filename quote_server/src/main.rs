//! Quotes WebSocket broadcast server.
//!
//! This binary periodically generates a batch of price quotes and pushes it to every
//! connected WebSocket client. Internally, it wires together three main building blocks:
//!
//! - `QuoteGenerator` — produces one `QuoteBatch` per period on its own thread and hands it
//!   to the coordinator through a bounded `crossbeam_channel`.
//! - `BroadcastCoordinator` — owns the live subscriber set; a single loop multiplexes
//!   registrations and batches with crossbeam `select!` and fans each serialized batch out
//!   to every subscriber queue.
//! - `listener::router` — an axum router that upgrades `/status` requests to WebSocket
//!   streams (one task and one `Subscriber` per client) and serves the dashboard on
//!   `/stock`.
//!
//! Concurrency and shutdown:
//! - Generator and coordinator run on their own threads, client streams run as tokio
//!   tasks; they share nothing but channels.
//! - A full subscriber queue is handled by the configured `OverflowPolicy`, so one slow
//!   client does not delay the others (unless `block` is chosen).
//! - When a client disconnects its stream unregisters the subscriber.
//! - Only a failure to bind the listening port (or invalid arguments) ends the process.
//!
//! Wire format: each batch is one text frame holding a JSON array such as
//! `[{"Name":"Apple","Price":7.3},{"Name":"Microsoft","Price":300.0}, ...]`.
#![warn(missing_docs)]
use crate::args::Args;
use crate::listener::{AppState, router, serve};
use crate::model::coordinator::BroadcastCoordinator;
use crate::model::quote_generator::QuoteGenerator;
use clap::Parser;
use log::info;
use quote_common::QuoteError;
use quote_common::Result;
use quote_common::net::addr;
use tokio::net::TcpListener;

mod args;
mod listener;
pub mod model;
mod stream;

#[tokio::main]
async fn main() -> Result<(), QuoteError> {
    init_logger();
    let args = Args::parse();
    args.validate()?;

    let generator = match args.seed {
        Some(seed) => {
            info!("Quote generator seeded with {}", seed);
            QuoteGenerator::seeded(seed)
        }
        None => QuoteGenerator::from_os_rng(),
    };
    let batches = generator.spawn(args.interval());
    let coordinator = BroadcastCoordinator::new(args.overflow).spawn(batches);
    info!(
        "Coordinator started: queue capacity {}, overflow policy {:?}",
        args.queue_capacity, args.overflow
    );

    let app = router(
        AppState {
            coordinator,
            queue_capacity: args.queue_capacity,
        },
        args.index,
    );
    let listener = TcpListener::bind(addr("0.0.0.0", args.port)).await?;
    info!("Serving at localhost:{}...", listener.local_addr()?.port());
    serve(listener, app).await
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
