// Copyright 2025 ytrpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::registry::BalancingMetricsRegistry;

/// Sink for the counters a balancing dispatcher maintains.
///
/// The dispatcher calls these at fixed points of a request's life:
///
/// - `total_inc` and `inflight_inc` when a dispatch starts
/// - `endpoint_request` every time an attempt is sent to an endpoint
/// - `failover_inc` each time it abandons an endpoint for another one
/// - `inflight_dec` exactly once when the dispatch finishes, fails or is cancelled
///
/// How the values are aggregated or exported is up to the implementation.
///
/// # Example
///
/// ```rust
/// use ytrpc_metrics::{BalancingMetrics, BalancingMetricsRegistry};
///
/// let registry = BalancingMetricsRegistry::new();
/// registry.total_inc();
/// registry.inflight_inc();
/// registry.inflight_dec();
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot.total, 1);
/// assert_eq!(snapshot.inflight, 0);
/// ```
pub trait BalancingMetrics: Send + Sync {
    fn inflight_inc(&self);

    fn inflight_dec(&self);

    fn failover_inc(&self);

    fn total_inc(&self);

    /// Records one attempt sent to `endpoint_addr`.
    fn endpoint_request(&self, _endpoint_addr: &str) {}
}

impl BalancingMetrics for BalancingMetricsRegistry {
    fn inflight_inc(&self) {
        self.increment_inflight();
    }

    fn inflight_dec(&self) {
        self.decrement_inflight();
    }

    fn failover_inc(&self) {
        self.increment_failover();
    }

    fn total_inc(&self) {
        self.increment_total();
    }

    fn endpoint_request(&self, endpoint_addr: &str) {
        self.record_endpoint_request(endpoint_addr);
    }
}

/// Discards everything. For callers that export nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl BalancingMetrics for NoopMetrics {
    fn inflight_inc(&self) {}

    fn inflight_dec(&self) {}

    fn failover_inc(&self) {}

    fn total_inc(&self) {}
}
