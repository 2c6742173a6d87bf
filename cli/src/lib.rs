pub mod commands;
pub use commands::*;

pub mod helpers;

use anyhow::Result;
use clap::Parser;

impl CLI {
    /// Parses `std::env::args()` and runs the resulting subcommand.
    pub fn parse_and_run() -> Result<String> {
        Self::parse().command.parse()
    }
}
