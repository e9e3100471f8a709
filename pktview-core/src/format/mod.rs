//! Value formatting utilities.
//!
//! Provides formatting functions shared by the record renderer and the CLI:
//! - Hex dumps of byte fields, truncated to a configurable limit
//! - Parsing of hex strings typed on the command line

mod hex;

pub use hex::{format_hex, parse_hex};
