use crate::snapshot::{BalancingSnapshot, EndpointMetrics};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock as StdRwLock};
use std::time::Instant;

static GLOBAL_REGISTRY: OnceLock<Arc<BalancingMetricsRegistry>> = OnceLock::new();

/// Returns the process-wide registry.
///
/// Dispatchers report here unless they are given another sink. The registry
/// is created on first use and lives until the process exits.
pub fn global_registry() -> Arc<BalancingMetricsRegistry> {
    GLOBAL_REGISTRY
        .get_or_init(|| Arc::new(BalancingMetricsRegistry::new()))
        .clone()
}

/// Per-endpoint request counter.
#[derive(Debug, Default)]
struct EndpointStats {
    request_count: AtomicU64,
}

/// Lock-free balancing counters.
///
/// # Concurrency Model
///
/// - **`inflight`, `failover`, `total`**: `AtomicU64`, updated with relaxed
///   ordering; they are independent and snapshots are eventually consistent.
/// - **Endpoint registry**: `RwLock<HashMap>` guarding entry creation only,
///   the counters inside entries are atomic.
///
/// `inflight` saturates at zero: a decrement without a matching increment is
/// dropped instead of wrapping around.
///
/// # Example
///
/// ```rust
/// use ytrpc_metrics::BalancingMetricsRegistry;
///
/// let registry = BalancingMetricsRegistry::new();
/// registry.increment_total();
/// registry.increment_inflight();
/// registry.record_endpoint_request("proxy-1:9013");
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot.total, 1);
/// assert_eq!(snapshot.inflight, 1);
/// ```
#[derive(Debug)]
pub struct BalancingMetricsRegistry {
    inflight: AtomicU64,
    failover: AtomicU64,
    total: AtomicU64,
    endpoints: StdRwLock<HashMap<String, Arc<EndpointStats>>>,
    start_time: Instant,
}

impl BalancingMetricsRegistry {
    pub fn new() -> Self {
        Self {
            inflight: AtomicU64::new(0),
            failover: AtomicU64::new(0),
            total: AtomicU64::new(0),
            endpoints: StdRwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    pub fn increment_inflight(&self) {
        self.inflight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_inflight(&self) {
        let _ = self
            .inflight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    pub fn increment_failover(&self) {
        self.failover.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_total(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inflight(&self) -> u64 {
        self.inflight.load(Ordering::Relaxed)
    }

    pub fn failover(&self) -> u64 {
        self.failover.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Counts one attempt sent to an endpoint.
    ///
    /// The write lock is taken only when the endpoint is seen for the first time.
    pub fn record_endpoint_request(&self, endpoint_addr: &str) {
        let existing = self
            .endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(endpoint_addr)
            .cloned();

        let stats = match existing {
            Some(stats) => stats,
            None => self
                .endpoints
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(endpoint_addr.to_string())
                .or_default()
                .clone(),
        };

        stats.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    pub fn snapshot(&self) -> BalancingSnapshot {
        let mut snapshot = BalancingSnapshot::new(self.uptime_ms());
        snapshot.inflight = self.inflight();
        snapshot.failover = self.failover();
        snapshot.total = self.total();
        snapshot.endpoints = self
            .endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(addr, stats)| {
                let mut metrics = EndpointMetrics::new(addr.clone());
                metrics.request_count = stats.request_count.load(Ordering::Relaxed);
                (addr.clone(), metrics)
            })
            .collect();
        snapshot
    }
}

impl Default for BalancingMetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
