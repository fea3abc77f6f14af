//! Per-tick sync decision.
//!
//! Evaluation order while both services are known:
//! 1. Edge detection on the input state, possibly yielding a manual start or
//!    stop command for the controller.
//! 2. Stop mismatch debounce. Asserting waits for more than
//!    [`SYNC_ERROR_DEBOUNCE_TICKS`] consecutive mismatch ticks, clearing is
//!    immediate.
//! 3. `last_input_state` takes the current input state unconditionally.
//!
//! When either service is missing the state resets and nothing is forwarded.

use std::fmt;

use crate::constants::{INPUT_STARTING, INPUT_STOPPING, SYNC_ERROR_DEBOUNCE_TICKS};
use crate::types::ObservedState;

const DEBOUNCE_CEILING: u32 = SYNC_ERROR_DEBOUNCE_TICKS + 1;

/// Value to write to the controller's manual start flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualStartCommand {
    Start,
    Stop,
}

impl ManualStartCommand {
    pub fn flag_value(self) -> i64 {
        match self {
            ManualStartCommand::Start => 1,
            ManualStartCommand::Stop => 0,
        }
    }
}

impl fmt::Display for ManualStartCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManualStartCommand::Start => write!(f, "manual start"),
            ManualStartCommand::Stop => write!(f, "manual stop"),
        }
    }
}

/// State carried from one tick to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    pub last_input_state: i64,
    pub debounce_count: u32,
    pub sync_error_active: bool,
}

/// Result of one [`SyncState::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: SyncState,
    pub command: Option<ManualStartCommand>,
    /// `sync_error_active` differs between the previous and next state.
    pub sync_error_changed: bool,
}

impl SyncState {
    /// State used while forwarding is inactive or after a transport fault.
    pub fn reset() -> Self {
        Self::default()
    }

    pub fn step(&self, observed: &ObservedState, forwarding_active: bool) -> Transition {
        if !forwarding_active {
            let next = Self::reset();
            return Transition {
                next,
                command: None,
                sync_error_changed: self.sync_error_active != next.sync_error_active,
            };
        }

        let command = if observed.input_state != self.last_input_state {
            edge_command(observed)
        } else {
            None
        };

        let (debounce_count, sync_error_active) = if observed.is_stop_mismatch() {
            let count = (self.debounce_count + 1).min(DEBOUNCE_CEILING);
            (count, count > SYNC_ERROR_DEBOUNCE_TICKS)
        } else {
            (0, false)
        };

        let next = SyncState {
            last_input_state: observed.input_state,
            debounce_count,
            sync_error_active,
        };
        Transition {
            next,
            command,
            sync_error_changed: self.sync_error_active != next.sync_error_active,
        }
    }
}

// A start is not stacked on top of any active run condition, and only a manual
// run is torn down by the switch.
fn edge_command(observed: &ObservedState) -> Option<ManualStartCommand> {
    match observed.input_state {
        INPUT_STARTING if observed.running_condition == 0 => Some(ManualStartCommand::Start),
        INPUT_STOPPING if observed.manual_run == 1 => Some(ManualStartCommand::Stop),
        _ => None,
    }
}
