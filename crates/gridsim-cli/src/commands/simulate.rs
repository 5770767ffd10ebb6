//! `gridsim simulate`: one batch of dispatches, then a report.

use anyhow::{Context, Result};
use tracing::info;

use gridsim_autoscale::AutoScaler;
use gridsim_balancer::Dispatcher;
use gridsim_core::SimConfig;
use gridsim_metrics::{aggregate, render_prometheus};

use super::{OutputFormat, RunArgs, build_pool};
use crate::report::RunReport;

pub fn simulate(args: &RunArgs, format: OutputFormat, autoscale: bool) -> Result<()> {
    let config = args.resolve()?;
    print!("{}", run(&config, format, autoscale)?);
    Ok(())
}

/// Run the batch described by `config` and render the outcome.
pub(crate) fn run(config: &SimConfig, format: OutputFormat, autoscale: bool) -> Result<String> {
    let sim = &config.simulation;
    let mut pool = build_pool(config).context("failed to build server pool")?;
    let mut dispatcher = Dispatcher::from_seed(sim.seed);

    info!(
        policy = %sim.policy,
        servers = pool.server_count(),
        requests = sim.requests,
        request_load = sim.request_load,
        "simulation started"
    );

    let batch = dispatcher
        .run_batch(
            &mut pool,
            sim.policy,
            sim.request_load,
            sim.requests,
            &sim.ip_prefix,
        )
        .context("dispatch failed")?;

    let mut report = RunReport::new(&pool, sim.policy, sim.request_load, &batch);
    let metrics = aggregate(&pool);

    if autoscale {
        let scaler = AutoScaler::new(
            config.autoscale.scale_up_threshold,
            config.autoscale.scale_down_threshold,
        );
        let from = pool.server_count();
        let decision = scaler.check_and_scale(&mut pool);
        report.record_scaling(from, decision);
    }

    let output = match format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            json
        }
        OutputFormat::Prometheus => render_prometheus(&metrics),
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsim_core::Policy;

    fn config(policy: Policy, load: f64) -> SimConfig {
        let mut config = SimConfig::default();
        config.simulation.policy = policy;
        config.simulation.request_load = load;
        config.simulation.seed = Some(42);
        config
    }

    #[test]
    fn text_output_for_each_policy() {
        for policy in Policy::ALL {
            let out = run(&config(policy, 50.0), OutputFormat::Text, false).unwrap();
            assert!(out.contains(policy.label()), "{out}");
            assert!(out.contains("server 2"));
        }
    }

    #[test]
    fn seeded_runs_render_identically() {
        let a = run(&config(Policy::WeightedRoundRobin, 50.0), OutputFormat::Prometheus, false)
            .unwrap();
        let b = run(&config(Policy::WeightedRoundRobin, 50.0), OutputFormat::Prometheus, false)
            .unwrap();
        assert_eq!(a, b);
        assert!(a.contains("gridsim_servers 3"));
    }

    #[test]
    fn json_output_reports_scale_up() {
        let out = run(&config(Policy::RoundRobin, 95.0), OutputFormat::Json, true).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(json["requests"], 100);
        assert_eq!(json["scaling"]["from"], 3);
        assert_eq!(json["scaling"]["to"], 4);
    }

    #[test]
    fn autoscale_in_band_reports_no_change() {
        let out = run(&config(Policy::RoundRobin, 50.0), OutputFormat::Text, true).unwrap();
        assert!(out.contains("Auto-scaling: no change (3 servers)"));
    }
}
