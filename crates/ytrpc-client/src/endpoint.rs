use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cool-down applied to an endpoint after a recoverable failure.
///
/// The cool-down grows exponentially with the number of consecutive failures
/// and is capped at `max_cooldown_ms`.
#[derive(Debug, Clone)]
pub struct CooldownConfig {
    /// Cool-down after the first failure (in milliseconds)
    pub base_cooldown_ms: u64,
    /// Maximum cool-down cap (in milliseconds)
    pub max_cooldown_ms: u64,
    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            base_cooldown_ms: 1000,
            max_cooldown_ms: 60_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl CooldownConfig {
    /// Calculate cool-down with exponential backoff based on consecutive failures
    pub fn calculate_cooldown(&self, consecutive_failures: u32) -> Duration {
        let exponent = consecutive_failures.max(1) - 1;
        let multiplier = self.backoff_multiplier.powi(exponent.min(i32::MAX as u32) as i32);
        let cooldown_ms = (self.base_cooldown_ms as f64 * multiplier) as u64;
        Duration::from_millis(cooldown_ms.min(self.max_cooldown_ms))
    }
}

/// Point-in-time view of an endpoint, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointStatus {
    pub addr: String,
    pub enabled: bool,
    pub live: bool,
    pub consecutive_failures: u32,
    pub cooldown_remaining: Duration,
    pub inflight: u64,
    /// Smoothed latency of successful calls, `None` before the first one.
    pub latency: Option<Duration>,
}

/// One RPC proxy the dispatcher can send requests to.
///
/// Health is kept in atomics so that the dispatcher can read and update it
/// from many tasks without locking. An endpoint is live when it is enabled
/// and its cool-down, if any, has elapsed.
#[derive(Debug)]
pub struct Endpoint {
    addr: String,
    /// Reference point for `unhealthy_until_ms`.
    created_at: Instant,
    disabled: AtomicBool,
    unhealthy_until_ms: AtomicU64,
    consecutive_failures: AtomicU32,
    inflight: AtomicU64,
    latency_ewma_us: AtomicU64,
}

impl Endpoint {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            created_at: Instant::now(),
            disabled: AtomicBool::new(false),
            unhealthy_until_ms: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
            inflight: AtomicU64::new(0),
            latency_ewma_us: AtomicU64::new(0),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn now_ms(&self) -> u64 {
        self.created_at.elapsed().as_millis() as u64
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled.load(Ordering::Acquire)
    }

    pub fn is_live(&self) -> bool {
        self.is_enabled() && self.cooldown_remaining().is_zero()
    }

    pub fn cooldown_remaining(&self) -> Duration {
        let until = self.unhealthy_until_ms.load(Ordering::Acquire);
        Duration::from_millis(until.saturating_sub(self.now_ms()))
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn inflight(&self) -> u64 {
        self.inflight.load(Ordering::Relaxed)
    }

    pub fn latency(&self) -> Option<Duration> {
        match self.latency_ewma_us.load(Ordering::Relaxed) {
            0 => None,
            us => Some(Duration::from_micros(us)),
        }
    }

    /// Manually takes the endpoint out of rotation. Only [`Endpoint::enable`] brings it back.
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Release);
    }

    /// Brings the endpoint back and forgets its failure history.
    pub fn enable(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.unhealthy_until_ms.store(0, Ordering::Release);
        self.disabled.store(false, Ordering::Release);
    }

    /// Counts one recoverable failure and returns the new streak length.
    pub fn record_failure(&self) -> u32 {
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed).saturating_add(1)
    }

    /// Keeps the endpoint out of selection for at least `cooldown`.
    ///
    /// Concurrent calls keep the latest deadline; a shorter cool-down never
    /// shortens one already in effect.
    pub fn mark_unhealthy(&self, cooldown: Duration) {
        let until = self.now_ms().saturating_add(cooldown.as_millis() as u64);
        self.unhealthy_until_ms.fetch_max(until, Ordering::AcqRel);
    }

    /// Resets health and folds `latency` into the moving average.
    pub fn record_success(&self, latency: Duration) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.unhealthy_until_ms.store(0, Ordering::Release);

        let sample = (latency.as_micros() as u64).max(1);
        let _ = self
            .latency_ewma_us
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |old| {
                Some(if old == 0 { sample } else { (old * 7 + sample) / 8 })
            });
    }

    /// Counts a request in flight on this endpoint until the guard is dropped.
    pub fn begin_request(self: &Arc<Self>) -> EndpointRequestGuard {
        self.inflight.fetch_add(1, Ordering::Relaxed);
        EndpointRequestGuard {
            endpoint: Arc::clone(self),
        }
    }

    pub fn status(&self) -> EndpointStatus {
        EndpointStatus {
            addr: self.addr.clone(),
            enabled: self.is_enabled(),
            live: self.is_live(),
            consecutive_failures: self.consecutive_failures(),
            cooldown_remaining: self.cooldown_remaining(),
            inflight: self.inflight(),
            latency: self.latency(),
        }
    }
}

/// Decrements the endpoint's in-flight count on drop.
#[derive(Debug)]
pub struct EndpointRequestGuard {
    endpoint: Arc<Endpoint>,
}

impl Drop for EndpointRequestGuard {
    fn drop(&mut self) {
        self.endpoint.inflight.fetch_sub(1, Ordering::Relaxed);
    }
}
