//! ytrpc Balancing Metrics
//!
//! Counters maintained by the balancing dispatcher:
//!
//! - **inflight**: dispatches started and not yet finished (never negative)
//! - **failover**: times a dispatch abandoned an endpoint for another one
//! - **total**: dispatches started
//!
//! plus a request count per endpoint.
//!
//! # Architecture
//!
//! - [`BalancingMetrics`]: the sink trait the dispatcher is written against
//! - [`BalancingMetricsRegistry`]: lock-free atomic implementation
//! - [`NoopMetrics`]: a sink that drops everything
//! - [`BalancingSnapshot`]: serializable copy of the registry state
//!
//! The dispatcher takes its sink as an `Arc<dyn BalancingMetrics>`; when none
//! is given it reports to [`global_registry`], shared by the whole process.
//!
//! # Usage Example
//!
//! ```rust
//! use ytrpc_metrics::{global_registry, BalancingMetrics};
//!
//! let registry = global_registry();
//! registry.total_inc();
//! println!("Total requests: {}", registry.snapshot().total);
//! ```

mod collector;
mod registry;
mod snapshot;

pub use collector::{BalancingMetrics, NoopMetrics};
pub use registry::{global_registry, BalancingMetricsRegistry};
pub use snapshot::{BalancingSnapshot, EndpointMetrics};
