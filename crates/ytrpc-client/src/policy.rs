use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::endpoint::Endpoint;

/// Chooses one endpoint out of the candidates the pool offers.
///
/// Candidates are never empty when the pool calls `pick`, but
/// implementations return `None` for an empty slice anyway.
pub trait BalancingPolicy: Send + Sync + Debug {
    fn pick(&self, candidates: &[Arc<Endpoint>]) -> Option<Arc<Endpoint>>;
}

/// Cycles through the candidates in order.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalancingPolicy for RoundRobin {
    fn pick(&self, candidates: &[Arc<Endpoint>]) -> Option<Arc<Endpoint>> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % candidates.len();
        Some(Arc::clone(&candidates[index]))
    }
}

/// Prefers the endpoint with the lowest smoothed latency, then the fewest
/// requests in flight. Endpoints without a latency sample go first so they
/// get measured.
#[derive(Debug, Default)]
pub struct LowestLatency;

impl BalancingPolicy for LowestLatency {
    fn pick(&self, candidates: &[Arc<Endpoint>]) -> Option<Arc<Endpoint>> {
        candidates
            .iter()
            .min_by_key(|endpoint| (endpoint.latency().unwrap_or_default(), endpoint.inflight()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn endpoints(addrs: &[&str]) -> Vec<Arc<Endpoint>> {
        addrs.iter().map(|a| Arc::new(Endpoint::new(*a))).collect()
    }

    #[test]
    fn test_round_robin() {
        let candidates = endpoints(&["proxy-1", "proxy-2", "proxy-3"]);
        let policy = RoundRobin::new();

        let picked: Vec<String> = (0..4)
            .map(|_| policy.pick(&candidates).unwrap().addr().to_string())
            .collect();
        // wraps around
        assert_eq!(picked, vec!["proxy-1", "proxy-2", "proxy-3", "proxy-1"]);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(RoundRobin::new().pick(&[]).is_none());
        assert!(LowestLatency.pick(&[]).is_none());
    }

    #[test]
    fn test_lowest_latency() {
        let candidates = endpoints(&["slow", "fast"]);
        candidates[0].record_success(Duration::from_millis(40));
        candidates[1].record_success(Duration::from_millis(2));

        assert_eq!(LowestLatency.pick(&candidates).unwrap().addr(), "fast");
    }

    #[test]
    fn test_lowest_latency_probes_unmeasured_endpoint() {
        let candidates = endpoints(&["measured", "fresh"]);
        candidates[0].record_success(Duration::from_millis(1));

        assert_eq!(LowestLatency.pick(&candidates).unwrap().addr(), "fresh");
    }

    #[test]
    fn test_lowest_latency_breaks_ties_by_inflight() {
        let candidates = endpoints(&["busy", "idle"]);
        let _guard = candidates[0].begin_request();

        assert_eq!(LowestLatency.pick(&candidates).unwrap().addr(), "idle");
    }
}
