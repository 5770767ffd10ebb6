//! gridsim-balancer: simulated server pool and dispatch policies.
//!
//! A `Dispatcher` sends synthetic requests into a `ServerPool` using one
//! of four policies, recording a load and response-time sample on the
//! chosen server for each request.
//!
//! # Architecture
//!
//! ```text
//! Dispatcher (seedable StdRng)
//!   ├── policy::select()  → server index (read-only on the pool)
//!   ├── synthesize()      → (load, response_time)
//!   ├── ServerPool::record()
//!   └── policy::commit()  → cursor advance / connection count
//!
//! ServerPool
//!   └── per server: loads, response_times, connections, weight
//! ```

pub mod dispatcher;
pub mod policy;
pub mod pool;

pub use dispatcher::Dispatcher;
pub use pool::{ServerHistory, ServerPool};
