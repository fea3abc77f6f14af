//! `genforward status` — read back the published forwarding values.

use anyhow::{Context, Result};
use clap::Args;

use genforward_core::ServiceName;
use genforward_daemon::dbus::{connect, ZbusBus};
use genforward_daemon::{read_status, BusKind, DaemonConfig, TimeoutBus};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Message bus to connect to: system or session.
    #[arg(long, default_value_t = BusKind::System)]
    pub bus: BusKind,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = DaemonConfig::for_bus(self.bus);
        let service = ServiceName::new(config.service_name.as_str())
            .context("invalid forwarding service name")?;

        let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
        let status = runtime.block_on(async {
            let connection = connect(config.bus)
                .await
                .with_context(|| format!("failed to connect to the {} bus", config.bus))?;
            let bus = TimeoutBus::new(
                ZbusBus::new(connection)
                    .await
                    .context("failed to reach the bus daemon")?,
                config.ipc_timeout,
            );
            read_status(&bus, &service)
                .await
                .context("failed to read forwarding status")
        })?;

        let payload = status.unwrap_or_else(|| {
            serde_json::json!({
                "running": false,
                "service": service.as_str(),
            })
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to render status JSON")?
        );
        Ok(())
    }
}
