//! AutoScaler: threshold-driven pool scaling.
//!
//! Reads the mean load of every server that has served traffic, takes the
//! busiest, and grows or shrinks the pool by one server when it crosses a
//! threshold. Each call looks only at the current history: there is no
//! cooldown and no memory of earlier decisions, so a load hovering at a
//! threshold can flap the pool between calls.

use tracing::{debug, info};

use gridsim_balancer::ServerPool;
use gridsim_metrics::active_mean_loads;

/// A scaling decision for a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Resize the pool to the specified server count.
    ScaleTo(usize),
    /// No change needed.
    NoChange,
}

/// Compares the busiest server's mean load against two fixed thresholds.
///
/// The thresholds are not validated; `scale_up_threshold` is expected to
/// exceed `scale_down_threshold`, and hosts check that before building one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScaler {
    scale_up_threshold: f64,
    scale_down_threshold: f64,
}

impl AutoScaler {
    pub fn new(scale_up_threshold: f64, scale_down_threshold: f64) -> Self {
        Self {
            scale_up_threshold,
            scale_down_threshold,
        }
    }

    pub fn scale_up_threshold(&self) -> f64 {
        self.scale_up_threshold
    }

    pub fn scale_down_threshold(&self) -> f64 {
        self.scale_down_threshold
    }

    /// Decide what the pool should look like without touching it.
    pub fn evaluate(&self, pool: &ServerPool) -> ScaleDecision {
        let avg_loads = active_mean_loads(pool);
        if avg_loads.is_empty() {
            debug!("no server has served traffic, skipping scale check");
            return ScaleDecision::NoChange;
        }

        let max_load = avg_loads.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let current = pool.server_count();

        if max_load > self.scale_up_threshold {
            debug!(
                max_load,
                threshold = self.scale_up_threshold,
                from = current,
                "load above scale-up threshold"
            );
            return ScaleDecision::ScaleTo(current + 1);
        }

        if max_load < self.scale_down_threshold {
            if current > 1 {
                debug!(
                    max_load,
                    threshold = self.scale_down_threshold,
                    from = current,
                    "load below scale-down threshold"
                );
                return ScaleDecision::ScaleTo(current - 1);
            }
            debug!(max_load, "pool already at one server, not scaling down");
        }

        ScaleDecision::NoChange
    }

    /// Evaluate the pool and apply the decision to it.
    pub fn check_and_scale(&self, pool: &mut ServerPool) -> ScaleDecision {
        let decision = self.evaluate(pool);
        if let ScaleDecision::ScaleTo(target) = decision {
            let from = pool.server_count();
            let to = if target > from { pool.grow() } else { pool.shrink() };
            info!(from, to, "server pool scaled");
        }
        decision
    }
}
