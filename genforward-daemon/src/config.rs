//! Startup configuration. Only the bus is chosen at startup; every timing
//! value comes from [`genforward_core::constants`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use genforward_core::constants::{FORWARDING_SERVICE_NAME, IPC_TIMEOUT, TICK_INTERVAL};

/// Which message bus to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusKind {
    #[default]
    System,
    /// Useful on a development machine without the platform services.
    Session,
}

impl FromStr for BusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "session" => Ok(Self::Session),
            other => Err(format!("unknown bus '{other}'; expected: system, session")),
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::System => write!(f, "system"),
            BusKind::Session => write!(f, "session"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub bus: BusKind,
    pub service_name: String,
    pub tick_interval: Duration,
    pub ipc_timeout: Duration,
    /// Published as `/Mgmt/ProcessName`.
    pub process_name: String,
    /// Published as `/Mgmt/ProcessVersion`.
    pub process_version: String,
}

impl DaemonConfig {
    pub fn for_bus(bus: BusKind) -> Self {
        Self {
            bus,
            ..Self::default()
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bus: BusKind::default(),
            service_name: FORWARDING_SERVICE_NAME.to_string(),
            tick_interval: TICK_INTERVAL,
            ipc_timeout: IPC_TIMEOUT,
            process_name: env!("CARGO_PKG_NAME").to_string(),
            process_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_kind_parses_case_insensitively() {
        assert_eq!("System".parse::<BusKind>(), Ok(BusKind::System));
        assert_eq!("session".parse::<BusKind>(), Ok(BusKind::Session));
        assert!("tcp".parse::<BusKind>().unwrap_err().contains("expected"));
    }

    #[test]
    fn default_config_uses_fixed_timing() {
        let config = DaemonConfig::for_bus(BusKind::Session);
        assert_eq!(config.bus, BusKind::Session);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert!(config.ipc_timeout < config.tick_interval);
        assert_eq!(config.service_name, "com.victronenergy.generator.Forwarding");
    }
}
