//! Server selection for each dispatch policy.
//!
//! Selection is read-only: it picks an index and leaves the pool alone.
//! Bookkeeping that follows a dispatch (cursor advance, connection count)
//! is applied by `commit` once the sample has been recorded.

use rand::Rng;
use sha2::{Digest, Sha256};

use gridsim_core::{Policy, ServerIndex, SimError, SimResult};

use crate::pool::ServerPool;

/// Choose the server for the next request under `policy`.
///
/// `key` is the client identity for `Policy::IpHash` and ignored otherwise.
/// Only weighted round robin consumes randomness.
pub fn select<R: Rng>(
    policy: Policy,
    pool: &ServerPool,
    key: Option<&str>,
    rng: &mut R,
) -> SimResult<ServerIndex> {
    pool.ensure_ready()?;

    match policy {
        Policy::RoundRobin => Ok(pool.rr_cursor()),
        Policy::LeastConnections => Ok(least_connections(&pool.connection_counts())),
        Policy::IpHash => {
            let key = key.ok_or_else(|| {
                SimError::InvalidArgument("ip-hash dispatch requires a client key".to_string())
            })?;
            Ok(ip_hash(key, pool.server_count()))
        }
        Policy::WeightedRoundRobin => {
            let weights = pool.weights();
            let total: f64 = weights.iter().sum();
            if !(total.is_finite() && total > 0.0) {
                return Err(SimError::InvalidState(format!(
                    "total server weight must be positive, got {total}"
                )));
            }
            let r = rng.gen_range(0.0..total);
            Ok(weighted_index(&weights, r))
        }
    }
}

/// Apply the state change that follows a dispatch to `index`.
pub(crate) fn commit(policy: Policy, pool: &mut ServerPool, index: ServerIndex) {
    match policy {
        Policy::RoundRobin => pool.advance_cursor(),
        Policy::LeastConnections => pool.add_connection(index),
        Policy::IpHash | Policy::WeightedRoundRobin => {}
    }
}

/// Index of the smallest count; the first minimum wins ties.
pub fn least_connections(counts: &[u64]) -> ServerIndex {
    let mut best = 0;
    for (index, count) in counts.iter().enumerate() {
        if *count < counts[best] {
            best = index;
        }
    }
    best
}

/// Stable 64-bit hash of a client key: the first 8 bytes of its SHA-256
/// digest, big-endian.
pub fn key_hash(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Map a client key onto `0..server_count`. `server_count` must be non-zero.
pub fn ip_hash(key: &str, server_count: usize) -> ServerIndex {
    (key_hash(key) % server_count as u64) as ServerIndex
}

/// Smallest index whose running weight total exceeds `r`.
///
/// `r` is expected in `[0, sum(weights))`; anything past the total (only
/// reachable through float rounding) lands on the last server.
pub fn weighted_index(weights: &[f64], r: f64) -> ServerIndex {
    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative > r {
            return index;
        }
    }
    weights.len().saturating_sub(1)
}
