use crate::helpers::stop_daemon;

use anyhow::Result;
use clap::Parser;

/// Stops a proxy previously started with `start --daemon`.
#[derive(Debug, Parser)]
pub struct Stop;

impl Stop {
    pub fn parse(self) -> Result<String> {
        let pid = stop_daemon()?;
        Ok(format!("Stopped PID {pid}"))
    }
}
