//! Candidate filtering and selection for service discovery.
//!
//! The daemon lists bus names and reads `/Type` of digital inputs; these
//! helpers decide which names qualify and which one wins. When several names
//! qualify, the lexicographically smallest is chosen so restarts pick the
//! same service.

use crate::constants::{DIGITAL_INPUT_PREFIX, GENERATOR_PREFIX};
use crate::types::ServiceName;

/// Outcome of choosing among matching services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub chosen: Option<ServiceName>,
    /// Matching services that lost the tie-break.
    pub ignored: Vec<ServiceName>,
}

/// How a discovered handle changed between two discovery passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceChange {
    Found(ServiceName),
    Lost(ServiceName),
    Switched { from: ServiceName, to: ServiceName },
}

/// Digital input services, before their `/Type` is checked.
pub fn input_candidates<'a, I>(names: I) -> Vec<ServiceName>
where
    I: IntoIterator<Item = &'a str>,
{
    with_prefix(names, DIGITAL_INPUT_PREFIX)
}

/// Generator start/stop controller services.
pub fn controller_candidates<'a, I>(names: I) -> Vec<ServiceName>
where
    I: IntoIterator<Item = &'a str>,
{
    with_prefix(names, GENERATOR_PREFIX)
}

/// Pick the smallest name; report the rest as ignored.
pub fn select(candidates: Vec<ServiceName>) -> Selection {
    let mut candidates = candidates;
    candidates.sort();
    candidates.dedup();
    let mut iter = candidates.into_iter();
    let chosen = iter.next();
    Selection {
        chosen,
        ignored: iter.collect(),
    }
}

pub fn change(
    previous: Option<&ServiceName>,
    current: Option<&ServiceName>,
) -> Option<ServiceChange> {
    match (previous, current) {
        (None, Some(to)) => Some(ServiceChange::Found(to.clone())),
        (Some(from), None) => Some(ServiceChange::Lost(from.clone())),
        (Some(from), Some(to)) if from != to => Some(ServiceChange::Switched {
            from: from.clone(),
            to: to.clone(),
        }),
        _ => None,
    }
}

fn with_prefix<'a, I>(names: I, prefix: &str) -> Vec<ServiceName>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .filter_map(|name| ServiceName::new(name).ok())
        .collect()
}
