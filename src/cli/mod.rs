//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Rendering overrides applied on top of a protocol
//! - Output formatting (full text or one line per packet)

mod args;
mod output;
mod render;

pub use args::{Args, DirectionArg, FlagArg};
pub use output::{OutputFormat, OutputFormatter};
pub use render::WithRenderOptions;
