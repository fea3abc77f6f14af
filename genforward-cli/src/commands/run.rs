//! `genforward run` — the bridge itself.

use anyhow::{Context, Result};
use clap::Args;

use genforward_daemon::{start_blocking, BusKind, DaemonConfig};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Message bus to connect to: system or session.
    #[arg(long, default_value_t = BusKind::System)]
    pub bus: BusKind,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        start_blocking(DaemonConfig::for_bus(self.bus)).context("forwarding loop exited with error")
    }
}
