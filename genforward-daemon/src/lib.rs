//! Generator digital input forwarding daemon: bus access, sync loop, status
//! publishing and the tokio runtime that drives them.

pub mod bus;
pub mod config;
pub mod dbus;
pub mod discovery;
mod error;
pub mod memory;
pub mod publisher;
pub mod reader;
mod runtime;
pub mod status;
pub mod sync_loop;

pub use bus::{Bus, StatusSink, TimeoutBus};
pub use config::{BusKind, DaemonConfig};
pub use error::DaemonError;
pub use runtime::{drive, init_tracing, run, start_blocking};
pub use status::read_status;
pub use sync_loop::{SyncLoop, TickReport};
