//! Quote data model and its JSON wire form.
//!
//! A `Quote` pairs an instrument name with a price. A batch of quotes is sent
//! to subscribers as one JSON array, e.g.
//! `[{"Name":"Apple","Price":7.3},{"Name":"Microsoft","Price":300.0}]`.
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// Price of a single named instrument at one generation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Quote {
    /// Instrument name as shown to subscribers.
    pub name: String,
    /// Price value. Zero or negative values are passed through unchanged.
    pub price: f64,
}

/// Quotes produced together by one generation tick, in broadcast order.
pub type QuoteBatch = Vec<Quote>;

impl Quote {
    /// Creates a quote for `name` at `price`.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// Decode a batch from the JSON text delivered to subscribers.
pub fn batch_from_json(text: &str) -> Result<QuoteBatch, QuoteError> {
    Ok(serde_json::from_str(text)?)
}
