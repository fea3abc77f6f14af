//! Ports between the sync loop and the message bus.
//!
//! [`Bus`] covers the remote services this process reads and writes,
//! [`StatusSink`] covers its own published status. [`TimeoutBus`] bounds every
//! call so a stalled peer surfaces as [`DaemonError::Timeout`].

use std::time::Duration;

use async_trait::async_trait;
use genforward_core::{ForwardingStatus, ServiceName};

use crate::error::DaemonError;

/// Access to BusItem objects on other services.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Every name currently owned on the bus.
    async fn list_names(&self) -> Result<Vec<String>, DaemonError>;

    /// Integer view of `GetValue` on `path`. Non-numeric values read as 0.
    async fn get_value(&self, service: &ServiceName, path: &str) -> Result<i64, DaemonError>;

    async fn get_text(&self, service: &ServiceName, path: &str) -> Result<String, DaemonError>;

    async fn set_value(
        &self,
        service: &ServiceName,
        path: &str,
        value: i64,
    ) -> Result<(), DaemonError>;
}

/// Write-only sink for the forwarding status.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn publish(&self, status: &ForwardingStatus) -> Result<(), DaemonError>;
}

/// Wraps a [`Bus`] so that each call fails after `limit`.
#[derive(Debug, Clone)]
pub struct TimeoutBus<B> {
    inner: B,
    limit: Duration,
}

impl<B> TimeoutBus<B> {
    pub fn new(inner: B, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

fn timeout_err(op: &'static str, service: &ServiceName, path: &str) -> DaemonError {
    DaemonError::Timeout {
        op,
        target: format!("{service}{path}"),
    }
}

#[async_trait]
impl<B: Bus> Bus for TimeoutBus<B> {
    async fn list_names(&self) -> Result<Vec<String>, DaemonError> {
        tokio::time::timeout(self.limit, self.inner.list_names())
            .await
            .map_err(|_| DaemonError::Timeout {
                op: "ListNames",
                target: "org.freedesktop.DBus".to_string(),
            })?
    }

    async fn get_value(&self, service: &ServiceName, path: &str) -> Result<i64, DaemonError> {
        tokio::time::timeout(self.limit, self.inner.get_value(service, path))
            .await
            .map_err(|_| timeout_err("GetValue", service, path))?
    }

    async fn get_text(&self, service: &ServiceName, path: &str) -> Result<String, DaemonError> {
        tokio::time::timeout(self.limit, self.inner.get_text(service, path))
            .await
            .map_err(|_| timeout_err("GetText", service, path))?
    }

    async fn set_value(
        &self,
        service: &ServiceName,
        path: &str,
        value: i64,
    ) -> Result<(), DaemonError> {
        tokio::time::timeout(self.limit, self.inner.set_value(service, path, value))
            .await
            .map_err(|_| timeout_err("SetValue", service, path))?
    }
}
