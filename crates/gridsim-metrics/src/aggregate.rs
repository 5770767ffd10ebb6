//! Per-server aggregation of a pool's sample history.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use gridsim_balancer::{ServerHistory, ServerPool};
use gridsim_core::{ServerIndex, ServerMetrics};

/// Summarize every in-range server of `pool`.
///
/// Servers that never served a request are zero-filled rather than
/// omitted, so the map always has exactly `server_count` entries.
pub fn aggregate(pool: &ServerPool) -> BTreeMap<ServerIndex, ServerMetrics> {
    let metrics: BTreeMap<_, _> = pool.servers().map(summarize).enumerate().collect();
    debug!(servers = metrics.len(), "pool metrics aggregated");
    metrics
}

/// Mean load of each in-range server that has at least one sample.
///
/// Idle servers are skipped, not counted as zero load.
pub fn active_mean_loads(pool: &ServerPool) -> Vec<f64> {
    pool.servers()
        .filter(|s| !s.is_empty())
        .map(|s| mean(s.loads().iter().copied()))
        .collect()
}

fn summarize(server: &ServerHistory) -> ServerMetrics {
    if server.is_empty() {
        return ServerMetrics::default();
    }
    ServerMetrics {
        avg_load: mean(server.loads().iter().copied()),
        max_load: server
            .loads()
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max),
        avg_response_time: mean(server.response_times().iter().copied()),
    }
}

/// Arithmetic mean; zero for an empty sequence.
pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Point-in-time view of a pool, as streamed by `gridsim monitor`.
///
/// Servers are keyed `server_<index>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub epoch: u64,
    pub server_count: usize,
    pub total_dispatches: usize,
    pub servers: BTreeMap<String, ServerMetrics>,
}

impl MetricsSnapshot {
    pub fn capture(pool: &ServerPool) -> Self {
        Self::from_metrics(pool, &aggregate(pool))
    }

    pub fn from_metrics(pool: &ServerPool, metrics: &BTreeMap<ServerIndex, ServerMetrics>) -> Self {
        Self {
            epoch: epoch_secs(),
            server_count: pool.server_count(),
            total_dispatches: pool.total_dispatches(),
            servers: metrics
                .iter()
                .map(|(index, m)| (format!("server_{index}"), *m))
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsim_balancer::Dispatcher;
    use gridsim_core::{Policy, PoolOptions, ShrinkPolicy};

    #[test]
    fn fresh_pool_is_zero_filled() {
        let pool = ServerPool::new(3).unwrap();
        let metrics = aggregate(&pool);

        assert_eq!(metrics.len(), 3);
        for index in 0..3 {
            assert_eq!(metrics[&index], ServerMetrics::default());
            assert_eq!(metrics[&index].avg_load, 0.0);
            assert_eq!(metrics[&index].max_load, 0.0);
            assert_eq!(metrics[&index].avg_response_time, 0.0);
        }
    }

    #[test]
    fn aggregate_matches_recorded_samples() {
        let mut pool = ServerPool::new(2).unwrap();
        let mut dispatcher = Dispatcher::seeded(4);
        let batch = dispatcher
            .run_batch(&mut pool, Policy::RoundRobin, 50.0, 6, "")
            .unwrap();

        let metrics = aggregate(&pool);
        let server0: Vec<_> = batch.iter().filter(|d| d.server == 0).collect();

        let avg = server0.iter().map(|d| d.load).sum::<f64>() / 3.0;
        let max = server0.iter().map(|d| d.load).fold(f64::MIN, f64::max);
        let rt = server0.iter().map(|d| d.response_time).sum::<f64>() / 3.0;

        assert!((metrics[&0].avg_load - avg).abs() < 1e-9);
        assert_eq!(metrics[&0].max_load, max);
        assert!((metrics[&0].avg_response_time - rt).abs() < 1e-9);
    }

    #[test]
    fn partially_idle_pool_zero_fills_idle_servers() {
        let mut pool = ServerPool::new(3).unwrap();
        let mut dispatcher = Dispatcher::seeded(4);
        dispatcher
            .dispatch(&mut pool, Policy::RoundRobin, 50.0, None)
            .unwrap();

        let metrics = aggregate(&pool);
        assert!(metrics[&0].avg_load > 0.0);
        assert_eq!(metrics[&1], ServerMetrics::default());
        assert_eq!(metrics[&2], ServerMetrics::default());
    }

    #[test]
    fn max_load_handles_negative_samples() {
        let mut pool = ServerPool::new(1).unwrap();
        let mut dispatcher = Dispatcher::seeded(8);
        dispatcher
            .run_batch(&mut pool, Policy::RoundRobin, -20.0, 10, "")
            .unwrap();

        let metrics = aggregate(&pool);
        assert!(metrics[&0].max_load < 0.0);
        assert!(metrics[&0].avg_load <= metrics[&0].max_load);
    }

    #[test]
    fn active_mean_loads_skips_idle_servers() {
        let mut pool = ServerPool::new(4).unwrap();
        let mut dispatcher = Dispatcher::seeded(4);
        dispatcher
            .run_batch(&mut pool, Policy::RoundRobin, 50.0, 2, "")
            .unwrap();

        assert_eq!(active_mean_loads(&pool).len(), 2);
        assert!(active_mean_loads(&ServerPool::new(2).unwrap()).is_empty());
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(std::iter::empty()), 0.0);
        assert_eq!(mean([1.0, 2.0, 6.0].into_iter()), 3.0);
    }

    #[test]
    fn snapshot_keys_servers_by_name() {
        let mut pool = ServerPool::new(2).unwrap();
        let mut dispatcher = Dispatcher::seeded(1);
        dispatcher
            .run_batch(&mut pool, Policy::RoundRobin, 30.0, 4, "")
            .unwrap();

        let snapshot = MetricsSnapshot::capture(&pool);
        assert_eq!(snapshot.server_count, 2);
        assert_eq!(snapshot.total_dispatches, 4);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"server_0\""));
        assert!(json.contains("\"avg_response_time\""));

        let parsed: MetricsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server_count, 2);
        assert_eq!(parsed.servers.len(), 2);
    }

    #[test]
    fn snapshot_counts_requests_beyond_history_window() {
        let options = PoolOptions {
            history_limit: Some(5),
            shrink: ShrinkPolicy::Drop,
        };
        let mut pool = ServerPool::with_options(2, options).unwrap();
        Dispatcher::seeded(6)
            .run_batch(&mut pool, Policy::RoundRobin, 50.0, 100, "")
            .unwrap();

        let snapshot = MetricsSnapshot::capture(&pool);
        assert_eq!(snapshot.total_dispatches, 100);
        assert_eq!(pool.server(0).unwrap().len(), 5);
    }
}
