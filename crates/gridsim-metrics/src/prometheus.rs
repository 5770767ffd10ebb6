//! Prometheus text exposition format.
//!
//! Renders aggregated pool metrics as gauges with a `server` label, so a
//! simulation run can be scraped or diffed like a real service's /metrics.

use std::collections::BTreeMap;

use gridsim_core::{ServerIndex, ServerMetrics};

/// Render per-server metrics into Prometheus text format.
pub fn render_prometheus(metrics: &BTreeMap<ServerIndex, ServerMetrics>) -> String {
    let mut out = String::new();

    out.push_str("# HELP gridsim_servers Number of servers in the pool.\n");
    out.push_str("# TYPE gridsim_servers gauge\n");
    out.push_str(&format!("gridsim_servers {}\n", metrics.len()));

    gauge(
        &mut out,
        "gridsim_server_avg_load",
        "Mean load of requests served.",
        metrics,
        |m| m.avg_load,
    );
    gauge(
        &mut out,
        "gridsim_server_max_load",
        "Highest load of any request served.",
        metrics,
        |m| m.max_load,
    );
    gauge(
        &mut out,
        "gridsim_server_avg_response_time",
        "Mean response time of requests served.",
        metrics,
        |m| m.avg_response_time,
    );

    out
}

fn gauge(
    out: &mut String,
    name: &str,
    help: &str,
    metrics: &BTreeMap<ServerIndex, ServerMetrics>,
    value: impl Fn(&ServerMetrics) -> f64,
) {
    out.push_str(&format!("# HELP {name} {help}\n"));
    out.push_str(&format!("# TYPE {name} gauge\n"));
    for (index, m) in metrics {
        out.push_str(&format!("{name}{{server=\"{index}\"}} {:.2}\n", value(m)));
    }
}
