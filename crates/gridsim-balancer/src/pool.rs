//! Server pool: per-server sample history, connection counters and weights.
//!
//! The pool is plain state. Dispatch policies read it to choose a server
//! and append samples through the crate-private recording methods; the
//! autoscaler resizes it through `grow` / `shrink`.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use gridsim_core::{PoolOptions, ServerIndex, ShrinkPolicy, SimError, SimResult};

/// Weight given to servers that were never assigned one.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Everything the pool knows about one server.
///
/// `loads` and `response_times` are pushed and trimmed together, so they
/// always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerHistory {
    loads: VecDeque<f64>,
    response_times: VecDeque<f64>,
    dispatches: usize,
    connections: u64,
    weight: f64,
}

impl ServerHistory {
    fn new() -> Self {
        Self {
            loads: VecDeque::new(),
            response_times: VecDeque::new(),
            dispatches: 0,
            connections: 0,
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn loads(&self) -> &VecDeque<f64> {
        &self.loads
    }

    pub fn response_times(&self) -> &VecDeque<f64> {
        &self.response_times
    }

    /// Requests ever recorded on this server, including samples the
    /// history window has since dropped.
    pub fn dispatches(&self) -> usize {
        self.dispatches
    }

    /// Cumulative least-connections assignments. Never decremented.
    pub fn connections(&self) -> u64 {
        self.connections
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    fn push(&mut self, load: f64, response_time: f64, limit: Option<usize>) {
        self.loads.push_back(load);
        self.response_times.push_back(response_time);
        self.dispatches += 1;
        if let Some(limit) = limit {
            while self.loads.len() > limit {
                self.loads.pop_front();
                self.response_times.pop_front();
            }
        }
    }
}

/// The simulated servers of one run.
///
/// `servers` may hold more entries than `server_count` when the pool was
/// shrunk under `ShrinkPolicy::Retain`; entries at or beyond `server_count`
/// are out of range and invisible to every public accessor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerPool {
    server_count: usize,
    rr_cursor: usize,
    servers: Vec<ServerHistory>,
    options: PoolOptions,
}

impl ServerPool {
    /// Create a pool of `server_count` idle servers with uniform weights.
    pub fn new(server_count: usize) -> SimResult<Self> {
        Self::with_options(server_count, PoolOptions::default())
    }

    pub fn with_options(server_count: usize, options: PoolOptions) -> SimResult<Self> {
        if server_count == 0 {
            return Err(SimError::InvalidArgument(
                "server pool needs at least one server".to_string(),
            ));
        }
        if options.history_limit == Some(0) {
            return Err(SimError::InvalidArgument(
                "history limit must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            server_count,
            rr_cursor: 0,
            servers: (0..server_count).map(|_| ServerHistory::new()).collect(),
            options,
        })
    }

    /// Replace the per-server weights. One positive, finite weight per server.
    pub fn set_weights(&mut self, weights: &[f64]) -> SimResult<()> {
        if weights.len() != self.server_count {
            return Err(SimError::InvalidArgument(format!(
                "expected {} weights, got {}",
                self.server_count,
                weights.len()
            )));
        }
        if let Some(bad) = weights.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
            return Err(SimError::InvalidArgument(format!(
                "weights must be positive and finite, got {bad}"
            )));
        }
        for (server, weight) in self.servers.iter_mut().zip(weights) {
            server.weight = *weight;
        }
        Ok(())
    }

    pub fn server_count(&self) -> usize {
        self.server_count
    }

    pub fn rr_cursor(&self) -> usize {
        self.rr_cursor
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// History of an in-range server.
    pub fn server(&self, index: ServerIndex) -> Option<&ServerHistory> {
        if index < self.server_count {
            self.servers.get(index)
        } else {
            None
        }
    }

    /// In-range servers in index order.
    pub fn servers(&self) -> impl Iterator<Item = &ServerHistory> {
        self.servers.iter().take(self.server_count)
    }

    pub fn weights(&self) -> Vec<f64> {
        self.servers().map(ServerHistory::weight).collect()
    }

    pub fn connection_counts(&self) -> Vec<u64> {
        self.servers().map(ServerHistory::connections).collect()
    }

    /// Requests recorded across in-range servers. Not bounded by the
    /// history window.
    pub fn total_dispatches(&self) -> usize {
        self.servers().map(ServerHistory::dispatches).sum()
    }

    /// Add one server at the end. Returns the new server count.
    ///
    /// Under `Retain`, a previously removed server comes back with its old
    /// history; otherwise the new server starts empty with weight 1.
    pub fn grow(&mut self) -> usize {
        if self.servers.len() <= self.server_count {
            self.servers.push(ServerHistory::new());
        }
        self.server_count += 1;
        debug!(servers = self.server_count, "server pool grew");
        self.server_count
    }

    /// Remove the last server, never going below one. Returns the new count.
    pub fn shrink(&mut self) -> usize {
        if self.server_count <= 1 {
            return self.server_count;
        }
        self.server_count -= 1;
        if self.options.shrink == ShrinkPolicy::Drop {
            self.servers.truncate(self.server_count);
        }
        self.rr_cursor %= self.server_count;
        debug!(
            servers = self.server_count,
            shrink = ?self.options.shrink,
            "server pool shrank"
        );
        self.server_count
    }

    /// Start over with `server_count` idle servers. All history, weights
    /// and the round-robin cursor are reset; options are kept.
    pub fn reconfigure(&mut self, server_count: usize) -> SimResult<()> {
        *self = Self::with_options(server_count, self.options.clone())?;
        debug!(servers = server_count, "server pool reconfigured");
        Ok(())
    }

    /// Fail when no policy can run against this pool.
    pub(crate) fn ensure_ready(&self) -> SimResult<()> {
        if self.server_count == 0 || self.servers.len() < self.server_count {
            return Err(SimError::InvalidState(
                "server pool has no servers".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn record(&mut self, index: ServerIndex, load: f64, response_time: f64) {
        let limit = self.options.history_limit;
        self.servers[index].push(load, response_time, limit);
    }

    pub(crate) fn advance_cursor(&mut self) {
        self.rr_cursor = (self.rr_cursor + 1) % self.server_count;
    }

    pub(crate) fn add_connection(&mut self, index: ServerIndex) {
        self.servers[index].connections += 1;
    }

    #[cfg(test)]
    pub(crate) fn force_empty(&mut self) {
        self.server_count = 0;
        self.servers.clear();
    }
}
