pub mod init;
pub mod monitor;
pub mod simulate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use gridsim_balancer::ServerPool;
use gridsim_core::{Policy, SimConfig, SimResult};

/// Settings shared by every command that runs a simulation.
///
/// Values start from `--config` (or the built-in defaults) and each flag
/// given on the command line overrides its file counterpart.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to a gridsim.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Number of servers. Discards file weights unless --weights is also given.
    #[arg(short, long)]
    pub servers: Option<usize>,
    /// Dispatch policy: round-robin, least-connections, ip-hash, weighted-round-robin
    #[arg(short, long)]
    pub policy: Option<Policy>,
    /// Mean load of each request
    #[arg(short, long)]
    pub load: Option<f64>,
    /// Requests per batch
    #[arg(short = 'n', long)]
    pub requests: Option<usize>,
    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
    /// Comma-separated per-server weights, e.g. 3,1,1
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<f64>>,
    /// Keep only this many recent samples per server
    #[arg(long)]
    pub history_limit: Option<usize>,
    /// Scale up when the busiest server's mean load exceeds this
    #[arg(long)]
    pub scale_up: Option<f64>,
    /// Scale down when the busiest server's mean load falls below this
    #[arg(long)]
    pub scale_down: Option<f64>,
}

impl RunArgs {
    /// Merge the config file (if any) with command-line overrides and validate.
    pub fn resolve(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => SimConfig::default(),
        };

        if let Some(servers) = self.servers {
            config.pool.servers = servers;
            config.pool.weights = None;
        }
        if let Some(weights) = &self.weights {
            config.pool.weights = Some(weights.clone());
        }
        if let Some(limit) = self.history_limit {
            config.pool.history_limit = Some(limit);
        }
        if let Some(policy) = self.policy {
            config.simulation.policy = policy;
        }
        if let Some(load) = self.load {
            config.simulation.request_load = load;
        }
        if let Some(requests) = self.requests {
            config.simulation.requests = requests;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = Some(seed);
        }
        if let Some(up) = self.scale_up {
            config.autoscale.scale_up_threshold = up;
        }
        if let Some(down) = self.scale_down {
            config.autoscale.scale_down_threshold = down;
        }

        config.validate().context("invalid simulation settings")?;
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Prometheus,
}

/// Build the pool a resolved config describes.
pub fn build_pool(config: &SimConfig) -> SimResult<ServerPool> {
    let mut pool = ServerPool::with_options(config.pool.servers, config.pool.options())?;
    if let Some(weights) = &config.pool.weights {
        pool.set_weights(weights)?;
    }
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;
    use std::io::Write;

    #[test]
    fn every_run_flag_has_help() {
        let cmd = RunArgs::augment_args(Command::new("gridsim"));
        for arg in cmd.get_arguments() {
            assert!(arg.get_help().is_some(), "--{} has no help", arg.get_id());
        }
    }

    #[test]
    fn resolve_defaults_without_config() {
        let config = RunArgs::default().resolve().unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[pool]\nservers = 2\nweights = [3.0, 1.0]\n\n[simulation]\npolicy = \"ip-hash\"\nrequests = 10"
        )
        .unwrap();

        let args = RunArgs {
            config: Some(file.path().to_path_buf()),
            load: Some(70.0),
            seed: Some(1),
            ..RunArgs::default()
        };
        let config = args.resolve().unwrap();

        assert_eq!(config.pool.servers, 2);
        assert_eq!(config.pool.weights, Some(vec![3.0, 1.0]));
        assert_eq!(config.simulation.policy, Policy::IpHash);
        assert_eq!(config.simulation.requests, 10);
        assert_eq!(config.simulation.request_load, 70.0);
        assert_eq!(config.simulation.seed, Some(1));
    }

    #[test]
    fn servers_flag_discards_file_weights() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pool]\nservers = 2\nweights = [3.0, 1.0]").unwrap();

        let args = RunArgs {
            config: Some(file.path().to_path_buf()),
            servers: Some(5),
            ..RunArgs::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.pool.servers, 5);
        assert_eq!(config.pool.weights, None);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let args = RunArgs {
            scale_up: Some(10.0),
            scale_down: Some(30.0),
            ..RunArgs::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = RunArgs {
            config: Some(dir.path().join("nope.toml")),
            ..RunArgs::default()
        };
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }

    #[test]
    fn build_pool_applies_weights() {
        let args = RunArgs {
            servers: Some(3),
            weights: Some(vec![2.0, 1.0, 1.0]),
            ..RunArgs::default()
        };
        let pool = build_pool(&args.resolve().unwrap()).unwrap();
        assert_eq!(pool.server_count(), 3);
        assert_eq!(pool.weights(), vec![2.0, 1.0, 1.0]);
    }
}
