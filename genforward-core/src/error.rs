//! Error types for genforward-core.

use thiserror::Error;

/// Errors raised while validating domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A bus name was empty or not a dotted well-known name.
    #[error("invalid service name '{0}': expected a dotted bus name")]
    InvalidServiceName(String),
}
