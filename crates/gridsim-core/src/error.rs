//! Simulation error types.

use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Every variant is a precondition violation. The core does no I/O, so
/// nothing here is transient and nothing is retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// The pool (or its configuration) is in a state no operation can run against.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An input the core validates was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type SimResult<T> = Result<T, SimError>;
