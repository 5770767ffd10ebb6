//! gridsim-core: shared vocabulary for the gridsim workspace.
//!
//! Holds the error type every crate returns, the domain types that cross
//! crate boundaries (`Policy`, `Dispatch`, `ServerMetrics`, pool options),
//! and the `gridsim.toml` configuration model.

pub mod config;
pub mod error;
pub mod types;

pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use types::*;
