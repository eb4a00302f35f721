//! Named instruments quoted by the server.
//!
//! The display form of each variant is the exact `Name` that goes over the
//! wire, so clients can map a received quote back to an `Instrument`.
use clap::ValueEnum;
use strum_macros::{Display, EnumIter, EnumString};

/// Set of instruments the reference generator quotes, in broadcast order.
#[allow(missing_docs)]
#[derive(
    Debug,
    Clone,
    Copy,
    ValueEnum,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
)]
#[clap(rename_all = "lower")]
#[strum(ascii_case_insensitive)]
pub enum Instrument {
    Apple,
    Microsoft,
    Google,
    Salesforce,
    LinkedIn,
    Yahoo,
    #[strum(serialize = "HP")]
    Hp,
    Dell,
    Levis,
    Bata,
}
