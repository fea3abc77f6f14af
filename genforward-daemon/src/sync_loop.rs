//! The per-second sync loop.
//!
//! Each [`SyncLoop::tick`] refreshes discovery when due, reads the observed
//! values, runs [`SyncState::step`], forwards a manual start/stop command when
//! one is produced and publishes the resulting status. A bus fault anywhere in
//! the tick clears discovery and resets the sync state; the next tick carries
//! on normally.

use std::time::Duration;

use genforward_core::constants::{DISCOVERY_INTERVAL_TICKS, MANUAL_START_PATH};
use genforward_core::{
    DiscoveredServices, ForwardingStatus, ManualStartCommand, ObservedState, SyncState, Transition,
};

use crate::bus::{Bus, StatusSink, TimeoutBus};
use crate::discovery;
use crate::error::DaemonError;
use crate::reader;

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// The status handed to the sink.
    pub status: ForwardingStatus,
    /// Command written to the controller this tick.
    pub forwarded: Option<ManualStartCommand>,
    /// Set when a bus fault reset the loop.
    pub fault: Option<String>,
}

pub struct SyncLoop<B, S> {
    bus: TimeoutBus<B>,
    sink: S,
    ipc_timeout: Duration,
    discovered: DiscoveredServices,
    state: SyncState,
    ticks_until_discovery: u32,
}

impl<B: Bus, S: StatusSink> SyncLoop<B, S> {
    pub fn new(bus: B, sink: S, ipc_timeout: Duration) -> Self {
        Self {
            bus: TimeoutBus::new(bus, ipc_timeout),
            sink,
            ipc_timeout,
            discovered: DiscoveredServices::default(),
            state: SyncState::default(),
            ticks_until_discovery: 0,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn discovered(&self) -> &DiscoveredServices {
        &self.discovered
    }

    pub async fn tick(&mut self) -> TickReport {
        let report = match self.sync_once().await {
            Ok((status, forwarded)) => TickReport {
                status,
                forwarded,
                fault: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "bus fault, clearing discovered services");
                let previous = self.discovered.clone();
                self.discovered.clear();
                discovery::log_changes(&previous, &self.discovered);

                let idle = ObservedState::default();
                let transition = self.state.step(&idle, false);
                self.commit(transition);
                TickReport {
                    status: ForwardingStatus::new(&self.discovered, &idle, &self.state),
                    forwarded: None,
                    fault: Some(err.to_string()),
                }
            }
        };

        match tokio::time::timeout(self.ipc_timeout, self.sink.publish(&report.status)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "failed to publish forwarding status"),
            Err(_) => tracing::warn!("publishing forwarding status timed out"),
        }
        report
    }

    async fn sync_once(
        &mut self,
    ) -> Result<(ForwardingStatus, Option<ManualStartCommand>), DaemonError> {
        // The countdown advances before discovering so a failed pass keeps
        // the ten-tick cadence.
        let discovery_due = self.ticks_until_discovery == 0;
        self.ticks_until_discovery = if discovery_due {
            DISCOVERY_INTERVAL_TICKS - 1
        } else {
            self.ticks_until_discovery - 1
        };
        if discovery_due {
            let found = discovery::discover(&self.bus).await?;
            discovery::log_changes(&self.discovered, &found);
            self.discovered = found;
        }

        let observed = reader::read_observed(&self.bus, &self.discovered).await?;
        let transition = self.state.step(&observed, self.discovered.both_present());

        if let (Some(command), Some(controller)) = (transition.command, &self.discovered.controller)
        {
            tracing::info!(service = %controller, "forwarding {command}");
            self.bus
                .set_value(controller, MANUAL_START_PATH, command.flag_value())
                .await?;
        }

        self.commit(transition);
        Ok((
            ForwardingStatus::new(&self.discovered, &observed, &self.state),
            transition.command,
        ))
    }

    fn commit(&mut self, transition: Transition) {
        if transition.sync_error_changed {
            if transition.next.sync_error_active {
                tracing::warn!("stop sync error detected");
            } else {
                tracing::info!("stop sync error cleared");
            }
        }
        self.state = transition.next;
    }
}
