//! In-memory [`Bus`] and [`StatusSink`] used by tests and local dry runs.
//!
//! Clones share state, so a test can keep a handle while the sync loop owns
//! another.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use genforward_core::{ForwardingStatus, ServiceName, StatusValue};

use crate::bus::{Bus, StatusSink};
use crate::error::DaemonError;

/// A `SetValue` call seen by the memory bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub service: String,
    pub path: String,
    pub value: i64,
}

#[derive(Debug, Default)]
struct MemoryState {
    services: BTreeMap<String, BTreeMap<String, StatusValue>>,
    writes: Vec<RecordedWrite>,
    failing: bool,
    hanging: bool,
    list_calls: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a service with integer paths. Replaces any existing service.
    pub fn add_service(&self, name: &str, values: &[(&str, i64)]) {
        let paths = values
            .iter()
            .map(|(path, value)| (path.to_string(), StatusValue::Int(*value)))
            .collect();
        self.lock().services.insert(name.to_string(), paths);
    }

    pub fn remove_service(&self, name: &str) {
        self.lock().services.remove(name);
    }

    /// Set or add one path on an existing service.
    pub fn set(&self, name: &str, path: &str, value: StatusValue) {
        if let Some(paths) = self.lock().services.get_mut(name) {
            paths.insert(path.to_string(), value);
        }
    }

    pub fn set_int(&self, name: &str, path: &str, value: i64) {
        self.set(name, path, StatusValue::Int(value));
    }

    pub fn value(&self, name: &str, path: &str) -> Option<StatusValue> {
        self.lock()
            .services
            .get(name)
            .and_then(|paths| paths.get(path))
            .cloned()
    }

    /// Every call fails with a transport error while set.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Every call never completes while set.
    pub fn set_hanging(&self, hanging: bool) {
        self.lock().hanging = hanging;
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.lock().writes.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    async fn gate(&self) -> Result<(), DaemonError> {
        let (failing, hanging) = {
            let state = self.lock();
            (state.failing, state.hanging)
        };
        if hanging {
            std::future::pending::<()>().await;
        }
        if failing {
            return Err(DaemonError::Transport("memory bus is failing".to_string()));
        }
        Ok(())
    }

    fn lookup(&self, service: &ServiceName, path: &str) -> Result<StatusValue, DaemonError> {
        self.value(service.as_str(), path).ok_or_else(|| {
            DaemonError::Transport(format!("unknown object {path} on {service}"))
        })
    }
}

#[async_trait]
impl Bus for MemoryBus {
    async fn list_names(&self) -> Result<Vec<String>, DaemonError> {
        self.gate().await?;
        let mut state = self.lock();
        state.list_calls += 1;
        Ok(state.services.keys().cloned().collect())
    }

    async fn get_value(&self, service: &ServiceName, path: &str) -> Result<i64, DaemonError> {
        self.gate().await?;
        Ok(match self.lookup(service, path)? {
            StatusValue::Int(value) => value,
            StatusValue::Flag(flag) => i64::from(flag),
            StatusValue::Text(_) | StatusValue::Invalid => 0,
        })
    }

    async fn get_text(&self, service: &ServiceName, path: &str) -> Result<String, DaemonError> {
        self.gate().await?;
        Ok(self.lookup(service, path)?.to_string())
    }

    async fn set_value(
        &self,
        service: &ServiceName,
        path: &str,
        value: i64,
    ) -> Result<(), DaemonError> {
        self.gate().await?;
        self.lookup(service, path)?;
        let mut state = self.lock();
        state.writes.push(RecordedWrite {
            service: service.to_string(),
            path: path.to_string(),
            value,
        });
        if let Some(paths) = state.services.get_mut(service.as_str()) {
            paths.insert(path.to_string(), StatusValue::Int(value));
        }
        Ok(())
    }
}

/// Records every published status.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatusSink {
    published: Arc<Mutex<Vec<ForwardingStatus>>>,
}

impl MemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<ForwardingStatus> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<ForwardingStatus> {
        self.published().pop()
    }
}

#[async_trait]
impl StatusSink for MemoryStatusSink {
    async fn publish(&self, status: &ForwardingStatus) -> Result<(), DaemonError> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(status.clone());
        Ok(())
    }
}
