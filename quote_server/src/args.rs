//! Command-line arguments for the Quote Server.
//!
//! Only the port is part of the core configuration; it is read from `PORT` when
//! `--port` is not given. The remaining flags tune the generator and the
//! delivery queues and all have working defaults.
use crate::model::quote_generator::DEFAULT_PERIOD;
use crate::model::subscriber::OverflowPolicy;
use clap::Parser;
use quote_common::net::DEFAULT_PORT;
use quote_common::{QuoteError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// TCP port to serve HTTP and WebSocket connections on.
    #[clap(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// HTML dashboard served on `/stock`.
    #[clap(long, default_value = "view/index.html")]
    pub index: PathBuf,

    /// Seconds between two quote batches.
    #[clap(long, default_value_t = DEFAULT_PERIOD.as_secs())]
    pub interval_secs: u64,

    /// Number of batches each subscriber queue can hold.
    #[clap(long, default_value_t = 1)]
    pub queue_capacity: usize,

    /// What to do when a subscriber queue is full.
    #[clap(long, value_enum, default_value_t = OverflowPolicy::DropOldest)]
    pub overflow: OverflowPolicy,

    /// Seed for the price generator; random when absent.
    #[clap(long)]
    pub seed: Option<u64>,
}

impl Args {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(QuoteError::Config("--interval-secs must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(QuoteError::Config("--queue-capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Generator period.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["quote_server", "--port", "8080"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_follow_reference_behavior() {
        let args = parse(&[]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.interval(), Duration::from_secs(5));
        assert_eq!(args.queue_capacity, 1);
        assert_eq!(args.overflow, OverflowPolicy::DropOldest);
        assert_eq!(args.index, PathBuf::from("view/index.html"));
        assert!(args.seed.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn parses_overflow_policy_names() {
        assert_eq!(parse(&["--overflow", "drop-newest"]).overflow, OverflowPolicy::DropNewest);
        assert_eq!(parse(&["--overflow", "block"]).overflow, OverflowPolicy::Block);
        assert!(Args::try_parse_from(["quote_server", "--overflow", "sometimes"]).is_err());
    }

    #[test]
    fn rejects_zero_interval_and_capacity() {
        assert!(matches!(
            parse(&["--interval-secs", "0"]).validate(),
            Err(QuoteError::Config(_))
        ));
        assert!(matches!(
            parse(&["--queue-capacity", "0"]).validate(),
            Err(QuoteError::Config(_))
        ));
    }
}
