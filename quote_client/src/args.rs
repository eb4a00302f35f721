//! Command-line arguments for the Quote Client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use quote_common::Instrument;
use quote_common::net::DEFAULT_PORT;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Server IP address (IPv4 or host name) where the quote service is running.
    #[clap(long, default_value = "127.0.0.1")]
    pub server_ip: String,

    /// Server port.
    #[clap(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Only print these instruments; repeat the flag for several. Prints all when absent.
    #[clap(long, value_enum)]
    pub only: Vec<Instrument>,
}
