//! Domain types shared by the balancer, metrics and autoscale crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Index of a server within a pool (`0..server_count`).
pub type ServerIndex = usize;

// ── Policy ─────────────────────────────────────────────────────────

/// A dispatch policy: how the balancer picks the server for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Strict rotation via a cursor.
    #[default]
    RoundRobin,
    /// Fewest cumulative assignments, ties to the lowest index.
    LeastConnections,
    /// Stable mapping of a client key onto a server.
    IpHash,
    /// Random draw proportional to per-server weight.
    WeightedRoundRobin,
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::RoundRobin,
        Policy::LeastConnections,
        Policy::IpHash,
        Policy::WeightedRoundRobin,
    ];

    /// Canonical kebab-case name, as used in `gridsim.toml` and on the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::RoundRobin => "round-robin",
            Policy::LeastConnections => "least-connections",
            Policy::IpHash => "ip-hash",
            Policy::WeightedRoundRobin => "weighted-round-robin",
        }
    }

    /// Human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Policy::RoundRobin => "Round Robin",
            Policy::LeastConnections => "Least Connections",
            Policy::IpHash => "IP Hash",
            Policy::WeightedRoundRobin => "Weighted Round Robin",
        }
    }

    /// Whether dispatching with this policy needs a client key.
    pub fn needs_key(&self) -> bool {
        matches!(self, Policy::IpHash)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "round-robin" | "rr" => Ok(Policy::RoundRobin),
            "least-connections" | "lc" => Ok(Policy::LeastConnections),
            "ip-hash" => Ok(Policy::IpHash),
            "weighted-round-robin" | "wrr" => Ok(Policy::WeightedRoundRobin),
            _ => Err(SimError::InvalidArgument(format!(
                "unknown dispatch policy: {s}"
            ))),
        }
    }
}

// ── Dispatch ───────────────────────────────────────────────────────

/// Outcome of dispatching one synthetic request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dispatch {
    pub server: ServerIndex,
    pub load: f64,
    pub response_time: f64,
}

// ── Metrics ────────────────────────────────────────────────────────

/// Summary of one server's sample history.
///
/// A server that never served a request reports all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerMetrics {
    pub avg_load: f64,
    pub max_load: f64,
    pub avg_response_time: f64,
}

// ── Pool options ───────────────────────────────────────────────────

/// What happens to the history of trailing servers removed by a shrink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkPolicy {
    /// Discard samples, connection counts and weights of removed servers.
    #[default]
    Drop,
    /// Keep them out of range; they come back if the pool grows again.
    Retain,
}

/// Tunables for a `ServerPool` beyond its size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Keep at most this many recent samples per server. `None` is unbounded.
    pub history_limit: Option<usize>,
    pub shrink: ShrinkPolicy,
}
