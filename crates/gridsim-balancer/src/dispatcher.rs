//! Dispatcher: runs one synthetic request through a policy and records
//! the resulting load and response-time sample on the chosen server.
//!
//! All randomness flows through the dispatcher's own generator, so a
//! seeded dispatcher replays the same selections and samples for the same
//! sequence of calls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::{debug, trace};

use gridsim_core::{Dispatch, Policy, SimError, SimResult};

use crate::policy;
use crate::pool::ServerPool;

/// Standard deviation of a load sample, as a fraction of the request load.
pub const LOAD_SPREAD: f64 = 0.1;

/// Response time is the load scaled by a factor drawn from this range.
pub const RESPONSE_FACTOR_MIN: f64 = 0.8;
pub const RESPONSE_FACTOR_MAX: f64 = 1.2;

pub struct Dispatcher {
    rng: StdRng,
}

impl Dispatcher {
    /// A dispatcher seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A reproducible dispatcher.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        }
    }

    /// Dispatch one request of mean load `request_load` under `policy`.
    ///
    /// Non-positive loads are accepted and simply produce degenerate
    /// samples. `key` is required for `Policy::IpHash`.
    pub fn dispatch(
        &mut self,
        pool: &mut ServerPool,
        policy: Policy,
        request_load: f64,
        key: Option<&str>,
    ) -> SimResult<Dispatch> {
        if !request_load.is_finite() {
            return Err(SimError::InvalidArgument(format!(
                "request load must be finite, got {request_load}"
            )));
        }

        let server = policy::select(policy, pool, key, &mut self.rng)?;
        let (load, response_time) = self.synthesize(request_load);

        pool.record(server, load, response_time);
        policy::commit(policy, pool, server);

        trace!(%policy, server, load, response_time, "request dispatched");
        Ok(Dispatch {
            server,
            load,
            response_time,
        })
    }

    /// Dispatch `requests` requests back to back.
    ///
    /// IP-hash keys are `{ip_prefix}{n}` for request number `n`, so each
    /// request in the batch looks like a different client.
    pub fn run_batch(
        &mut self,
        pool: &mut ServerPool,
        policy: Policy,
        request_load: f64,
        requests: usize,
        ip_prefix: &str,
    ) -> SimResult<Vec<Dispatch>> {
        let mut dispatches = Vec::with_capacity(requests);
        for n in 0..requests {
            let key = policy.needs_key().then(|| format!("{ip_prefix}{n}"));
            dispatches.push(self.dispatch(pool, policy, request_load, key.as_deref())?);
        }
        debug!(
            %policy,
            requests,
            servers = pool.server_count(),
            "batch dispatched"
        );
        Ok(dispatches)
    }

    /// Draw `(load, response_time)`: load ~ Normal(mean, 0.1 * |mean|),
    /// response time = load * Uniform(0.8, 1.2).
    fn synthesize(&mut self, request_load: f64) -> (f64, f64) {
        let z: f64 = self.rng.sample(StandardNormal);
        let load = request_load + LOAD_SPREAD * request_load.abs() * z;
        let factor = self
            .rng
            .gen_range(RESPONSE_FACTOR_MIN..RESPONSE_FACTOR_MAX);
        (load, load * factor)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
