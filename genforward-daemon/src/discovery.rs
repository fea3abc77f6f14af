//! Locating the generator digital input and the start/stop controller.

use genforward_core::constants::{GENERATOR_INPUT_TYPE, INPUT_TYPE_PATH};
use genforward_core::discovery::{self, Selection, ServiceChange};
use genforward_core::{DiscoveredServices, ServiceName};

use crate::bus::Bus;
use crate::error::DaemonError;

/// One discovery pass. Any bus fault aborts the whole pass.
pub async fn discover<B: Bus + ?Sized>(bus: &B) -> Result<DiscoveredServices, DaemonError> {
    let names = bus.list_names().await?;

    let controllers = discovery::select(discovery::controller_candidates(
        names.iter().map(String::as_str),
    ));
    warn_ignored("generator startstop", &controllers);

    let mut inputs = Vec::new();
    for candidate in discovery::input_candidates(names.iter().map(String::as_str)) {
        if bus.get_value(&candidate, INPUT_TYPE_PATH).await? == GENERATOR_INPUT_TYPE {
            inputs.push(candidate);
        }
    }
    let inputs = discovery::select(inputs);
    warn_ignored("generator digital input", &inputs);

    Ok(DiscoveredServices {
        input: inputs.chosen,
        controller: controllers.chosen,
    })
}

/// Log how each handle changed between `previous` and `current`.
pub fn log_changes(previous: &DiscoveredServices, current: &DiscoveredServices) {
    log_change(
        "generator digital input",
        previous.input.as_ref(),
        current.input.as_ref(),
    );
    log_change(
        "generator startstop",
        previous.controller.as_ref(),
        current.controller.as_ref(),
    );
}

fn log_change(kind: &str, previous: Option<&ServiceName>, current: Option<&ServiceName>) {
    match discovery::change(previous, current) {
        Some(ServiceChange::Found(service)) => {
            tracing::info!(service = %service, "found {kind} service");
        }
        Some(ServiceChange::Lost(service)) => {
            tracing::info!(service = %service, "no {kind} service");
        }
        Some(ServiceChange::Switched { from, to }) => {
            tracing::info!(from = %from, service = %to, "{kind} service changed");
        }
        None => {}
    }
}

fn warn_ignored(kind: &str, selection: &Selection) {
    if let Some(chosen) = &selection.chosen {
        for ignored in &selection.ignored {
            tracing::warn!(
                service = %chosen,
                ignored = %ignored,
                "multiple {kind} services, using the first by name",
            );
        }
    }
}
