//! gridsim-autoscale: threshold-driven server pool scaling.
//!
//! Feeds the per-server mean loads computed by `gridsim-metrics` back into
//! the pool's size.
//!
//! # Scaling Algorithm
//!
//! ```text
//! loads    = mean load of each server with at least one sample
//! if loads is empty: no action
//! max_load = max(loads)
//!
//! if max_load > scale_up_threshold:
//!     ScaleTo(servers + 1)
//! elif max_load < scale_down_threshold and servers > 1:
//!     ScaleTo(servers - 1)
//! ```
//!
//! Boundaries are inclusive in the no-action band. There is no cooldown:
//! every call decides from the history as it is now.

pub mod scaler;

pub use scaler::{AutoScaler, ScaleDecision};
