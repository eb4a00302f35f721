//! Shared networking constants and helpers used by client and server.

/// Port used when the `PORT` environment variable is not set.
pub const DEFAULT_PORT: u16 = 5000;
/// Path of the WebSocket endpoint that streams quote batches.
pub const STATUS_PATH: &str = "/status";
/// Path of the HTML dashboard.
pub const STOCK_PATH: &str = "/stock";

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}

/// WebSocket URL of the quote stream on `ip:port`.
pub fn status_url(ip: &str, port: u16) -> String {
    format!("ws://{}{}", addr(ip, port), STATUS_PATH)
}
