use thiserror::Error;

/// Error surface for bus access, publishing and the runtime.
///
/// Every variant raised during a tick is treated as a transport fault by the
/// sync loop: discovery is cleared and the loop carries on.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error("D-Bus daemon error: {0}")]
    Fdo(#[from] zbus::fdo::Error),

    #[error("{op} on {target} timed out")]
    Timeout { op: &'static str, target: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(context: &'static str, source: std::io::Error) -> DaemonError {
    DaemonError::Io { context, source }
}
