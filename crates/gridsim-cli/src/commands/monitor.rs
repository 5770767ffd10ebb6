//! `gridsim monitor`: periodic batches with a JSON snapshot per tick.
//!
//! The pool lives inside the loop's task and nothing else touches it, so
//! dispatch, aggregation and scaling never interleave.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use gridsim_autoscale::{AutoScaler, ScaleDecision};
use gridsim_balancer::Dispatcher;
use gridsim_core::SimConfig;
use gridsim_metrics::MetricsSnapshot;

use super::{RunArgs, build_pool};

pub async fn monitor(args: &RunArgs, interval_ms: u64, ticks: Option<u64>) -> Result<()> {
    let config = args.resolve()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!(error = %e, "cannot listen for ctrl-c; monitor runs until --ticks"),
        }
    });

    run(
        &config,
        Duration::from_millis(interval_ms),
        ticks,
        shutdown_rx,
        |line| println!("{line}"),
    )
    .await?;
    Ok(())
}

/// Run batches every `interval` until `ticks` batches have run or the
/// shutdown signal flips. A dropped sender is not a shutdown. Returns the
/// number of batches run.
pub(crate) async fn run(
    config: &SimConfig,
    interval: Duration,
    ticks: Option<u64>,
    mut shutdown: watch::Receiver<bool>,
    mut emit: impl FnMut(&str),
) -> Result<u64> {
    let sim = &config.simulation;
    let mut pool = build_pool(config).context("failed to build server pool")?;
    let mut dispatcher = Dispatcher::from_seed(sim.seed);
    let scaler = AutoScaler::new(
        config.autoscale.scale_up_threshold,
        config.autoscale.scale_down_threshold,
    );

    info!(
        interval_ms = interval.as_millis() as u64,
        policy = %sim.policy,
        servers = pool.server_count(),
        "monitor started"
    );

    let mut tick = 0u64;
    loop {
        if ticks.is_some_and(|max| tick >= max) {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                tick += 1;
                dispatcher
                    .run_batch(&mut pool, sim.policy, sim.request_load, sim.requests, &sim.ip_prefix)
                    .context("dispatch failed")?;

                let snapshot = MetricsSnapshot::capture(&pool);
                emit(&snapshot.to_json()?);

                if scaler.check_and_scale(&mut pool) == ScaleDecision::NoChange {
                    debug!(tick, servers = pool.server_count(), "no scaling needed");
                }
            }
            Ok(()) = shutdown.changed() => {
                info!("monitor shutting down");
                break;
            }
        }
    }

    info!(ticks = tick, servers = pool.server_count(), "monitor stopped");
    Ok(tick)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(load: f64) -> SimConfig {
        let mut config = SimConfig::default();
        config.simulation.request_load = load;
        config.simulation.requests = 30;
        config.simulation.seed = Some(3);
        config
    }

    #[tokio::test]
    async fn emits_one_snapshot_per_tick() {
        let (_tx, rx) = watch::channel(false);
        let mut lines = Vec::new();

        let ran = run(&config(50.0), Duration::from_millis(1), Some(3), rx, |l| {
            lines.push(l.to_string())
        })
        .await
        .unwrap();

        assert_eq!(ran, 3);
        assert_eq!(lines.len(), 3);
        let last: MetricsSnapshot = serde_json::from_str(&lines[2]).unwrap();
        assert_eq!(last.total_dispatches, 90);
        assert_eq!(last.server_count, 3);
    }

    #[tokio::test]
    async fn hot_load_grows_pool_each_tick() {
        let (_tx, rx) = watch::channel(false);
        let mut lines = Vec::new();

        run(&config(95.0), Duration::from_millis(1), Some(3), rx, |l| {
            lines.push(l.to_string())
        })
        .await
        .unwrap();

        let counts: Vec<usize> = lines
            .iter()
            .map(|l| serde_json::from_str::<MetricsSnapshot>(l).unwrap().server_count)
            .collect();
        // Snapshots are taken before each tick's scaling check.
        assert_eq!(counts, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn dropped_shutdown_sender_keeps_running() {
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let mut lines = Vec::new();
        let ran = run(&config(50.0), Duration::from_millis(1), Some(2), rx, |l| {
            lines.push(l.to_string())
        })
        .await
        .unwrap();

        assert_eq!(ran, 2);
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let mut lines = Vec::new();
        let ran = run(&config(50.0), Duration::from_secs(60), None, rx, |l| {
            lines.push(l.to_string())
        })
        .await
        .unwrap();

        assert_eq!(ran, 0);
        assert!(lines.is_empty());
    }
}
