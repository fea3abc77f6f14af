//! Domain types shared by the sync loop and its publisher.
//!
//! Everything here is re-derived from bus reads on every tick; nothing is
//! persisted.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::constants::INPUT_STOPPING;
use crate::error::CoreError;
use crate::sync::SyncState;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A well-known bus name such as `com.victronenergy.digitalinput.input01`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    /// Validate and wrap a bus name.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.contains('.')
            && !name.starts_with('.')
            && !name.ends_with('.')
            && !name.chars().any(char::is_whitespace);
        if valid {
            Ok(Self(name))
        } else {
            Err(CoreError::InvalidServiceName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ServiceName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Discovery result
// ---------------------------------------------------------------------------

/// Which of the two collaborating services are currently known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredServices {
    pub input: Option<ServiceName>,
    pub controller: Option<ServiceName>,
}

impl DiscoveredServices {
    /// Forwarding only happens while both sides are known.
    pub fn both_present(&self) -> bool {
        self.input.is_some() && self.controller.is_some()
    }

    /// Forget both services, as after a transport fault.
    pub fn clear(&mut self) {
        self.input = None;
        self.controller = None;
    }
}

// ---------------------------------------------------------------------------
// Per-tick observation
// ---------------------------------------------------------------------------

/// Values read from the bus this tick. Absent services read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedState {
    pub input_state: i64,
    pub manual_run: i64,
    pub running_condition: i64,
}

impl ObservedState {
    pub fn new(input_state: i64, manual_run: i64, running_condition: i64) -> Self {
        Self {
            input_state,
            manual_run,
            running_condition,
        }
    }

    /// The switch reports "stopped" while the controller holds a run condition.
    pub fn is_stop_mismatch(&self) -> bool {
        self.input_state == INPUT_STOPPING && self.running_condition != 0
    }
}

// ---------------------------------------------------------------------------
// Published status
// ---------------------------------------------------------------------------

/// Object paths published by the forwarding service, in publish order.
pub const STATUS_PATHS: [&str; 7] = [
    "/DigitalInputService",
    "/GeneratorService",
    "/InputState",
    "/ManualStart",
    "/RunningCondition",
    "/StopSyncError",
    "/ForwardingActive",
];

/// A single published value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusValue {
    Text(String),
    Int(i64),
    Flag(bool),
    /// No value. Sent on the bus as an empty array.
    Invalid,
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusValue::Text(text) => text.fmt(f),
            StatusValue::Int(value) => value.fmt(f),
            StatusValue::Flag(flag) => i64::from(*flag).fmt(f),
            StatusValue::Invalid => Ok(()),
        }
    }
}

/// Snapshot mirrored to the forwarding service after every tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForwardingStatus {
    pub digital_input_service: String,
    pub generator_service: String,
    pub input_state: i64,
    pub manual_start: i64,
    pub running_condition: i64,
    pub stop_sync_error: bool,
    pub forwarding_active: bool,
}

impl ForwardingStatus {
    pub fn new(
        discovered: &DiscoveredServices,
        observed: &ObservedState,
        state: &SyncState,
    ) -> Self {
        let name_or_empty =
            |name: &Option<ServiceName>| name.as_ref().map(ToString::to_string).unwrap_or_default();
        Self {
            digital_input_service: name_or_empty(&discovered.input),
            generator_service: name_or_empty(&discovered.controller),
            input_state: observed.input_state,
            manual_start: observed.manual_run,
            running_condition: observed.running_condition,
            stop_sync_error: state.sync_error_active,
            forwarding_active: discovered.both_present(),
        }
    }

    /// `(path, value)` pairs in [`STATUS_PATHS`] order.
    pub fn to_paths(&self) -> [(&'static str, StatusValue); 7] {
        [
            (
                STATUS_PATHS[0],
                StatusValue::Text(self.digital_input_service.clone()),
            ),
            (
                STATUS_PATHS[1],
                StatusValue::Text(self.generator_service.clone()),
            ),
            (STATUS_PATHS[2], StatusValue::Int(self.input_state)),
            (STATUS_PATHS[3], StatusValue::Int(self.manual_start)),
            (STATUS_PATHS[4], StatusValue::Int(self.running_condition)),
            (STATUS_PATHS[5], StatusValue::Flag(self.stop_sync_error)),
            (STATUS_PATHS[6], StatusValue::Flag(self.forwarding_active)),
        ]
    }
}
