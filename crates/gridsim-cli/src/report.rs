//! Run report: what a simulation did, for the terminal or as JSON.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use gridsim_autoscale::ScaleDecision;
use gridsim_balancer::ServerPool;
use gridsim_core::{Dispatch, Policy, ServerIndex, ServerMetrics};
use gridsim_metrics::analysis::DEFAULT_CAPACITY;
use gridsim_metrics::{
    LoadDistribution, PerformanceMetrics, aggregate, load_distribution, performance, utilization,
};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub policy: Policy,
    pub request_load: f64,
    pub requests: usize,
    pub server_count: usize,
    pub servers: BTreeMap<ServerIndex, ServerReport>,
    pub distribution: LoadDistribution,
    pub performance: PerformanceMetrics,
    /// Present when an auto-scaling check ran after the batch.
    pub scaling: Option<ScalingReport>,
    pub epoch: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerReport {
    #[serde(flatten)]
    pub metrics: ServerMetrics,
    pub requests: usize,
    /// Mean load as a percentage of a capacity of 100.
    pub utilization: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScalingReport {
    pub from: usize,
    pub to: usize,
}

impl RunReport {
    /// Build a report from the pool as it was right after the batch.
    pub fn new(pool: &ServerPool, policy: Policy, request_load: f64, batch: &[Dispatch]) -> Self {
        let metrics = aggregate(pool);
        let servers = metrics
            .iter()
            .map(|(&index, m)| {
                let loads: Vec<f64> = pool
                    .server(index)
                    .map(|s| s.loads().iter().copied().collect())
                    .unwrap_or_default();
                let report = ServerReport {
                    metrics: *m,
                    requests: batch.iter().filter(|d| d.server == index).count(),
                    utilization: utilization(&loads, DEFAULT_CAPACITY),
                };
                (index, report)
            })
            .collect();
        let response_times: Vec<f64> = batch.iter().map(|d| d.response_time).collect();

        Self {
            policy,
            request_load,
            requests: batch.len(),
            server_count: pool.server_count(),
            servers,
            distribution: load_distribution(&metrics),
            performance: performance(&response_times),
            scaling: None,
            epoch: epoch_secs(),
        }
    }

    pub fn record_scaling(&mut self, from: usize, decision: ScaleDecision) {
        let to = match decision {
            ScaleDecision::ScaleTo(to) => to,
            ScaleDecision::NoChange => from,
        };
        self.scaling = Some(ScalingReport { from, to });
    }

    /// Plain-text summary, also suitable as a notification body.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Algorithm: {}", self.policy.label());
        let _ = writeln!(out, "Number of Servers: {}", self.server_count);
        let _ = writeln!(out, "Request Load: {}", self.request_load);
        let _ = writeln!(out, "Requests: {}", self.requests);
        out.push('\n');

        let _ = writeln!(
            out,
            "{:<8} {:>8} {:>10} {:>10} {:>14} {:>8}",
            "SERVER", "REQUESTS", "AVG LOAD", "MAX LOAD", "AVG RESPONSE", "UTIL %"
        );
        for (index, s) in &self.servers {
            let _ = writeln!(
                out,
                "{:<8} {:>8} {:>10.1} {:>10.1} {:>12.1}ms {:>8.1}",
                format!("server {index}"),
                s.requests,
                s.metrics.avg_load,
                s.metrics.max_load,
                s.metrics.avg_response_time,
                s.utilization,
            );
        }
        out.push('\n');

        let d = &self.distribution;
        let _ = writeln!(
            out,
            "Load: min {:.1}, max {:.1}, std {:.2}, imbalance {:.1}",
            d.min_load, d.max_load, d.std_load, d.load_imbalance
        );
        let p = &self.performance;
        let _ = writeln!(
            out,
            "Response time: avg {:.1}ms, p95 {:.1}ms, p99 {:.1}ms",
            p.avg_response_time, p.p95_response_time, p.p99_response_time
        );

        if let Some(scaling) = &self.scaling {
            if scaling.to == scaling.from {
                let _ = writeln!(out, "Auto-scaling: no change ({} servers)", scaling.from);
            } else {
                let _ = writeln!(
                    out,
                    "Auto-scaling: {} -> {} servers",
                    scaling.from, scaling.to
                );
            }
        }

        let _ = writeln!(out, "Time: {}", self.epoch);
        out
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
