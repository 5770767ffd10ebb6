//! gridsim-metrics: observability for simulated server pools.
//!
//! Reduces per-server sample history into summary metrics, analyses how
//! load is spread across the pool, and renders results for humans,
//! dashboards and Prometheus.
//!
//! # Architecture
//!
//! ```text
//! aggregate(pool)        → BTreeMap<server, ServerMetrics>  (zero-filled)
//!   ├── load_distribution() → min / max / std / imbalance
//!   ├── render_prometheus() → text/plain exposition
//!   └── MetricsSnapshot     → JSON keyed server_<i>
//!
//! performance(samples)   → avg / p95 / p99 response time
//! utilization(samples)   → % of capacity
//! ```

pub mod aggregate;
pub mod analysis;
pub mod prometheus;

pub use aggregate::{MetricsSnapshot, active_mean_loads, aggregate};
pub use analysis::{LoadDistribution, PerformanceMetrics, load_distribution, performance, utilization};
pub use prometheus::render_prometheus;
