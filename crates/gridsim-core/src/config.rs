//! gridsim.toml configuration parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::types::{Policy, PoolOptions, ShrinkPolicy};

pub const DEFAULT_SERVERS: usize = 3;
pub const DEFAULT_REQUEST_LOAD: f64 = 50.0;
pub const DEFAULT_REQUESTS: usize = 100;
pub const DEFAULT_IP_PREFIX: &str = "192.168.0.";
pub const DEFAULT_SCALE_UP_THRESHOLD: f64 = 80.0;
pub const DEFAULT_SCALE_DOWN_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub pool: PoolConfig,
    pub simulation: SimulationConfig,
    pub autoscale: AutoscaleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub servers: usize,
    pub weights: Option<Vec<f64>>,
    pub history_limit: Option<usize>,
    pub shrink: ShrinkPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            servers: DEFAULT_SERVERS,
            weights: None,
            history_limit: None,
            shrink: ShrinkPolicy::Drop,
        }
    }
}

impl PoolConfig {
    pub fn options(&self) -> PoolOptions {
        PoolOptions {
            history_limit: self.history_limit,
            shrink: self.shrink,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub policy: Policy,
    pub request_load: f64,
    pub requests: usize,
    pub seed: Option<u64>,
    /// IP-hash keys are `{ip_prefix}{request number}`.
    pub ip_prefix: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            policy: Policy::RoundRobin,
            request_load: DEFAULT_REQUEST_LOAD,
            requests: DEFAULT_REQUESTS,
            seed: None,
            ip_prefix: DEFAULT_IP_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoscaleConfig {
    pub scale_up_threshold: f64,
    pub scale_down_threshold: f64,
}

impl Default for AutoscaleConfig {
    fn default() -> Self {
        Self {
            scale_up_threshold: DEFAULT_SCALE_UP_THRESHOLD,
            scale_down_threshold: DEFAULT_SCALE_DOWN_THRESHOLD,
        }
    }
}

impl SimConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> SimResult<Self> {
        toml::from_str(content).map_err(|e| SimError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a gridsim.toml with every default spelled out.
    pub fn scaffold(servers: usize, policy: Policy) -> Self {
        SimConfig {
            pool: PoolConfig {
                servers,
                weights: Some(vec![1.0; servers]),
                ..PoolConfig::default()
            },
            simulation: SimulationConfig {
                policy,
                seed: Some(42),
                ..SimulationConfig::default()
            },
            autoscale: AutoscaleConfig::default(),
        }
    }

    /// Check the settings a host must get right before building a pool.
    ///
    /// The autoscaler itself never validates its thresholds; an inverted
    /// pair would flap the pool, so hosts reject it here.
    pub fn validate(&self) -> SimResult<()> {
        if self.pool.servers == 0 {
            return Err(SimError::InvalidArgument(
                "pool.servers must be at least 1".to_string(),
            ));
        }
        if let Some(weights) = &self.pool.weights
            && weights.len() != self.pool.servers
        {
            return Err(SimError::InvalidArgument(format!(
                "pool.weights has {} entries for {} servers",
                weights.len(),
                self.pool.servers
            )));
        }
        if self.pool.history_limit == Some(0) {
            return Err(SimError::InvalidArgument(
                "pool.history_limit must be at least 1".to_string(),
            ));
        }
        if self.simulation.requests == 0 {
            return Err(SimError::InvalidArgument(
                "simulation.requests must be at least 1".to_string(),
            ));
        }
        if self.autoscale.scale_up_threshold <= self.autoscale.scale_down_threshold {
            return Err(SimError::InvalidState(format!(
                "scale_up_threshold ({}) must exceed scale_down_threshold ({})",
                self.autoscale.scale_up_threshold, self.autoscale.scale_down_threshold
            )));
        }
        Ok(())
    }
}
