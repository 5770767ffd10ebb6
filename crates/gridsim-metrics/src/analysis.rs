//! Load analysis over aggregated metrics: utilization, how evenly load is
//! spread across servers, and response-time percentiles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gridsim_core::{ServerIndex, ServerMetrics};

use crate::aggregate::mean;

/// Capacity a load sample is measured against by default.
pub const DEFAULT_CAPACITY: f64 = 100.0;

/// Spread of average load across servers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadDistribution {
    pub min_load: f64,
    pub max_load: f64,
    /// Population standard deviation of per-server average load.
    pub std_load: f64,
    /// `max_load - min_load`.
    pub load_imbalance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub avg_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,
}

/// Mean load as a percentage of `capacity`. Zero for no samples.
pub fn utilization(loads: &[f64], capacity: f64) -> f64 {
    if loads.is_empty() {
        return 0.0;
    }
    mean(loads.iter().copied()) / capacity * 100.0
}

/// Distribution of `avg_load` over every server in `metrics`, idle servers
/// included as zero.
pub fn load_distribution(metrics: &BTreeMap<ServerIndex, ServerMetrics>) -> LoadDistribution {
    let loads: Vec<f64> = metrics.values().map(|m| m.avg_load).collect();
    if loads.is_empty() {
        return LoadDistribution::default();
    }

    let min_load = loads.iter().copied().fold(f64::INFINITY, f64::min);
    let max_load = loads.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = mean(loads.iter().copied());
    let variance = mean(loads.iter().map(|l| (l - avg).powi(2)));

    LoadDistribution {
        min_load,
        max_load,
        std_load: variance.sqrt(),
        load_imbalance: max_load - min_load,
    }
}

/// Mean and tail response time over a set of samples.
pub fn performance(response_times: &[f64]) -> PerformanceMetrics {
    if response_times.is_empty() {
        return PerformanceMetrics::default();
    }

    let mut sorted = response_times.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    PerformanceMetrics {
        avg_response_time: mean(sorted.iter().copied()),
        p95_response_time: percentile(&sorted, 95.0),
        p99_response_time: percentile(&sorted, 99.0),
    }
}

/// Linear-interpolated percentile of an ascending, non-empty slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
