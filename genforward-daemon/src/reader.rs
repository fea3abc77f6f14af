//! Reading the observed values for one tick.

use genforward_core::constants::{INPUT_STATE_PATH, MANUAL_START_PATH, RUNNING_CONDITION_PATH};
use genforward_core::{DiscoveredServices, ObservedState};

use crate::bus::Bus;
use crate::error::DaemonError;

/// Absent services contribute zeros; a bus fault on a present one is an error.
pub async fn read_observed<B: Bus + ?Sized>(
    bus: &B,
    discovered: &DiscoveredServices,
) -> Result<ObservedState, DaemonError> {
    let input_state = match &discovered.input {
        Some(input) => bus.get_value(input, INPUT_STATE_PATH).await?,
        None => 0,
    };

    let (manual_run, running_condition) = match &discovered.controller {
        Some(controller) => (
            bus.get_value(controller, MANUAL_START_PATH).await?,
            bus.get_value(controller, RUNNING_CONDITION_PATH).await?,
        ),
        None => (0, 0),
    };

    Ok(ObservedState::new(input_state, manual_run, running_condition))
}
