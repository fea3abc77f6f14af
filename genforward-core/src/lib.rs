//! genforward core library — domain types, the sync state machine, errors.
//!
//! Nothing in this crate performs I/O:
//! - [`constants`] — bus names, object paths, state codes, timing
//! - [`types`] — service handles, observed values, published status
//! - [`sync`] — [`SyncState`] and its per-tick transition
//! - [`discovery`] — picking the input and controller services from candidates
//! - [`error`] — [`CoreError`]

pub mod constants;
pub mod discovery;
pub mod error;
pub mod sync;
pub mod types;

pub use error::CoreError;
pub use sync::{ManualStartCommand, SyncState, Transition};
pub use types::{
    DiscoveredServices, ForwardingStatus, ObservedState, ServiceName, StatusValue, STATUS_PATHS,
};
