//! Process startup, the tick scheduler and shutdown handling.

use std::future::Future;
use std::time::Duration;

use genforward_core::constants::DISCOVERY_INTERVAL_TICKS;
use tokio::time::MissedTickBehavior;

use crate::bus::{Bus, StatusSink};
use crate::config::DaemonConfig;
use crate::dbus::ZbusBus;
use crate::error::{io_err, DaemonError};
use crate::publisher::{self, DbusStatusPublisher};
use crate::sync_loop::SyncLoop;

/// Start the bridge and block the current thread until it exits.
pub fn start_blocking(config: DaemonConfig) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio runtime startup", e))?;
    runtime.block_on(run(config))
}

/// Register the forwarding service and run the sync loop until ctrl-c or
/// SIGTERM.
pub async fn run(config: DaemonConfig) -> Result<(), DaemonError> {
    tracing::info!(bus = %config.bus, "generator digital input forwarding starting");

    let connection = publisher::serve(&config).await?;
    let bus = ZbusBus::new(connection.clone()).await?;
    let sink = DbusStatusPublisher::new(connection);
    let mut sync_loop = SyncLoop::new(bus, sink, config.ipc_timeout);

    let ticks = drive(&mut sync_loop, config.tick_interval, shutdown_signal()).await?;
    tracing::info!(ticks, "generator digital input forwarding stopped");
    Ok(())
}

/// Tick `sync_loop` every `period` until `shutdown` resolves. Returns the
/// number of ticks run.
///
/// Each tick is awaited to completion before the next interval tick; missed
/// ticks are skipped rather than bunched.
pub async fn drive<B, S, F>(
    sync_loop: &mut SyncLoop<B, S>,
    period: Duration,
    shutdown: F,
) -> Result<u64, DaemonError>
where
    B: Bus,
    S: StatusSink,
    F: Future<Output = Result<(), DaemonError>>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            _ = interval.tick() => {
                let report = sync_loop.tick().await;
                ticks += 1;
                if ticks % u64::from(DISCOVERY_INTERVAL_TICKS) == 0 {
                    tracing::debug!(
                        ticks,
                        forwarding_active = report.status.forwarding_active,
                        "sync loop heartbeat",
                    );
                }
            }
        }
    }
    Ok(ticks)
}

async fn shutdown_signal() -> Result<(), DaemonError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).map_err(|e| io_err("SIGTERM handler", e))?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.map_err(|e| io_err("ctrl-c handler", e))?;
                tracing::info!("received ctrl-c, shutting down");
            }
            _ = terminate.recv() => {
                tracing::info!("received SIGTERM, shutting down");
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| io_err("ctrl-c handler", e))?;
        tracing::info!("received ctrl-c, shutting down");
        Ok(())
    }
}

pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBus, MemoryStatusSink};

    #[tokio::test(start_paused = true)]
    async fn drive_ticks_once_per_period_until_shutdown() {
        let bus = MemoryBus::new();
        let sink = MemoryStatusSink::new();
        let mut sync_loop = SyncLoop::new(bus.clone(), sink.clone(), Duration::from_millis(500));

        let shutdown = async {
            tokio::time::sleep(Duration::from_millis(3_500)).await;
            Ok(())
        };
        let ticks = drive(&mut sync_loop, Duration::from_secs(1), shutdown)
            .await
            .unwrap();

        // Immediate first tick, then at 1s, 2s and 3s.
        assert_eq!(ticks, 4);
        assert_eq!(sink.published().len(), 4);
        assert_eq!(bus.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_shutdown_future_is_reported() {
        let mut sync_loop = SyncLoop::new(
            MemoryBus::new(),
            MemoryStatusSink::new(),
            Duration::from_millis(500),
        );
        let shutdown = async { Err(DaemonError::Transport("signal setup failed".to_string())) };
        let err = drive(&mut sync_loop, Duration::from_secs(1), shutdown)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("signal setup failed"));
    }
}
