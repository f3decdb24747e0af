use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{info, warn};

use crate::endpoint::{Endpoint, EndpointStatus};
use crate::policy::{BalancingPolicy, RoundRobin};

/// The set of RPC proxies a dispatcher balances over.
///
/// Membership changes take a short write lock; selection takes a read lock
/// and clones the candidates out, so the lock is never held across an await.
/// Endpoint health lives in the endpoints themselves.
///
/// # Selection Order
///
/// 1. Live endpoints not yet tried by this dispatch
/// 2. Any live endpoint
/// 3. The enabled endpoint whose cool-down ends soonest
///
/// The last step keeps a dispatch going when every proxy is cooling down,
/// so the attempt budget is spent on real sends.
///
/// # Example
///
/// ```
/// use ytrpc_client::EndpointPool;
///
/// let pool = EndpointPool::new(vec!["proxy-1:9013".to_string(), "proxy-2:9013".to_string()]);
/// assert_eq!(pool.endpoint_count(), 2);
///
/// let first = pool.select(&[]).unwrap();
/// let second = pool.select(&[first.clone()]).unwrap();
/// assert_ne!(first.addr(), second.addr());
/// ```
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: RwLock<Vec<Arc<Endpoint>>>,
    policy: Box<dyn BalancingPolicy>,
}

impl EndpointPool {
    /// Creates a round-robin pool over `addrs`. Duplicate addresses are dropped.
    pub fn new(addrs: Vec<String>) -> Self {
        Self::with_policy(addrs, Box::new(RoundRobin::new()))
    }

    pub fn with_policy(addrs: Vec<String>, policy: Box<dyn BalancingPolicy>) -> Self {
        let pool = Self {
            endpoints: RwLock::new(Vec::with_capacity(addrs.len())),
            policy,
        };
        for addr in addrs {
            pool.add_endpoint(addr);
        }
        pool
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<Endpoint>>> {
        self.endpoints.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an endpoint. Returns `false` if the address is already present.
    pub fn add_endpoint(&self, addr: impl Into<String>) -> bool {
        let addr = addr.into();
        let mut endpoints = self.endpoints.write().unwrap_or_else(PoisonError::into_inner);
        if endpoints.iter().any(|e| e.addr() == addr) {
            return false;
        }
        endpoints.push(Arc::new(Endpoint::new(addr)));
        true
    }

    /// Removes an endpoint. Dispatches already holding it finish normally.
    pub fn remove_endpoint(&self, addr: &str) -> bool {
        let mut endpoints = self.endpoints.write().unwrap_or_else(PoisonError::into_inner);
        let before = endpoints.len();
        endpoints.retain(|e| e.addr() != addr);
        let removed = endpoints.len() != before;
        if removed {
            info!("Removed endpoint: {}", addr);
        }
        removed
    }

    /// Manually takes an endpoint out of rotation.
    pub fn disable_endpoint(&self, addr: &str) -> bool {
        match self.endpoint(addr) {
            Some(endpoint) => {
                endpoint.disable();
                info!("Manually disabled endpoint: {}", addr);
                true
            }
            None => false,
        }
    }

    /// Re-enables an endpoint and clears its cool-down.
    pub fn enable_endpoint(&self, addr: &str) -> bool {
        match self.endpoint(addr) {
            Some(endpoint) => {
                endpoint.enable();
                info!("Manually enabled endpoint: {}", addr);
                true
            }
            None => false,
        }
    }

    pub fn endpoint(&self, addr: &str) -> Option<Arc<Endpoint>> {
        self.read().iter().find(|e| e.addr() == addr).cloned()
    }

    pub fn endpoint_count(&self) -> usize {
        self.read().len()
    }

    pub fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.read().clone()
    }

    pub fn addrs(&self) -> Vec<String> {
        self.read().iter().map(|e| e.addr().to_string()).collect()
    }

    /// Endpoints currently eligible for selection.
    pub fn list_live_endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.read().iter().filter(|e| e.is_live()).cloned().collect()
    }

    pub fn statuses(&self) -> Vec<EndpointStatus> {
        self.read().iter().map(|e| e.status()).collect()
    }

    /// Keeps `endpoint` out of selection for `cooldown`.
    pub fn mark_unhealthy(&self, endpoint: &Endpoint, cooldown: Duration) {
        endpoint.mark_unhealthy(cooldown);
        warn!(
            endpoint = %endpoint.addr(),
            consecutive_failures = endpoint.consecutive_failures(),
            cooldown_ms = cooldown.as_millis() as u64,
            "Endpoint marked unhealthy"
        );
    }

    /// Picks the endpoint for the next attempt, avoiding those in `tried`.
    ///
    /// Returns `None` only when no endpoint is enabled.
    pub fn select(&self, tried: &[Arc<Endpoint>]) -> Option<Arc<Endpoint>> {
        let enabled: Vec<Arc<Endpoint>> = self.read().iter().filter(|e| e.is_enabled()).cloned().collect();
        if enabled.is_empty() {
            return None;
        }

        let live: Vec<Arc<Endpoint>> = enabled.iter().filter(|e| e.is_live()).cloned().collect();
        let fresh: Vec<Arc<Endpoint>> = live
            .iter()
            .filter(|e| !tried.iter().any(|t| t.addr() == e.addr()))
            .cloned()
            .collect();

        if let Some(endpoint) = self.policy.pick(&fresh) {
            return Some(endpoint);
        }
        if let Some(endpoint) = self.policy.pick(&live) {
            return Some(endpoint);
        }

        let endpoint = enabled.into_iter().min_by_key(|e| e.cooldown_remaining())?;
        warn!(
            endpoint = %endpoint.addr(),
            cooldown_remaining_ms = endpoint.cooldown_remaining().as_millis() as u64,
            "No live endpoints, using the one recovering soonest"
        );
        Some(endpoint)
    }
}
