use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;
use ytrpc_common::protocol::{RecoverableError, WireMessage};
use ytrpc_common::{Result, YtError};
use ytrpc_metrics::{global_registry, BalancingMetrics};

use crate::endpoint::{CooldownConfig, Endpoint};
use crate::pool::EndpointPool;
use crate::request::{Operation, Request};
use crate::transport::Transport;

/// Configuration for retry logic with exponential backoff.
///
/// A recoverable failure moves the request to another endpoint, waiting a
/// little longer before each new attempt.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    ///
    /// Default: 3
    pub max_attempts: usize,
    /// Wait before the second attempt, in milliseconds
    ///
    /// Default: 10ms
    pub initial_backoff_ms: u64,
    /// Maximum backoff in milliseconds
    ///
    /// Default: 1000ms
    pub max_backoff_ms: u64,
    /// Each retry waits: previous_backoff * multiplier
    ///
    /// Default: 2.0
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 10,
            max_backoff_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Settings of a [`BalancingDispatcher`].
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub retry: RetryConfig,
    pub cooldown: CooldownConfig,
    /// Per-attempt deadline for requests that carry no timeout of their own
    ///
    /// Default: 30000ms
    pub default_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            cooldown: CooldownConfig::default(),
            default_timeout_ms: 30_000,
        }
    }
}

impl DispatchConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// Keeps `inflight` raised for the life of one dispatch.
///
/// Dropping the guard is the only decrement, so a dispatch that returns,
/// fails or is cancelled at any await point lowers the counter exactly once.
struct InflightGuard<'a> {
    metrics: &'a dyn BalancingMetrics,
}

impl<'a> InflightGuard<'a> {
    fn new(metrics: &'a dyn BalancingMetrics) -> Self {
        metrics.inflight_inc();
        Self { metrics }
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.metrics.inflight_dec();
    }
}

/// Sends requests to a pool of RPC proxies with failover.
///
/// Each dispatch:
///
/// 1. Encodes the request once; every attempt resends the same message
/// 2. Picks an endpoint, preferring live ones it has not tried yet
/// 3. Sends with a per-attempt deadline (request timeout, else the default)
/// 4. On a recoverable failure, puts the endpoint on cool-down and fails
///    over until `max_attempts` attempts were made
/// 5. On an unrecoverable failure, returns the error without retrying
///
/// Cancellation is dropping the returned future: the in-flight counter is
/// restored and no endpoint is penalized for the abandoned attempt.
///
/// A dispatcher is shared by reference between tasks; it holds no per-request
/// state.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ytrpc_client::request::RemountTable;
/// use ytrpc_client::{BalancingDispatcher, EndpointPool, TcpRpcTransport};
/// use ytrpc_common::YPath;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = Arc::new(EndpointPool::new(vec!["proxy-1:9013".to_string()]));
/// let dispatcher = BalancingDispatcher::new(pool, Arc::new(TcpRpcTransport::default()));
///
/// dispatcher.dispatch(&RemountTable::new(YPath::new("//home/table")?)).await?;
/// # Ok(())
/// # }
/// ```
pub struct BalancingDispatcher {
    pool: Arc<EndpointPool>,
    transport: Arc<dyn Transport>,
    metrics: Arc<dyn BalancingMetrics>,
    config: DispatchConfig,
}

impl BalancingDispatcher {
    /// Creates a dispatcher with default settings, reporting to the global registry.
    pub fn new(pool: Arc<EndpointPool>, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(pool, transport, DispatchConfig::default())
    }

    pub fn with_config(pool: Arc<EndpointPool>, transport: Arc<dyn Transport>, config: DispatchConfig) -> Self {
        Self {
            pool,
            transport,
            metrics: global_registry(),
            config,
        }
    }

    /// Reports to `metrics` instead of the global registry.
    pub fn with_metrics(mut self, metrics: Arc<dyn BalancingMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Sends a typed request and decodes the typed response.
    ///
    /// # Returns
    /// - `Ok(O::Response)` - the first successful response
    /// - `Err(YtError::UnrecoverableDispatch)` - the server rejected the request
    /// - `Err(YtError::RetryBudgetExhausted)` - every attempt failed recoverably
    /// - `Err(YtError::NoEndpoints)` - no endpoint is enabled
    /// - `Err(YtError::Encoding)` - the request or response could not be (de)serialized
    pub async fn dispatch<O: Operation>(&self, request: &Request<O>) -> Result<O::Response> {
        let message = request.encode()?;
        let timeout = request
            .options()
            .timeout()
            .unwrap_or_else(|| self.config.default_timeout());

        let body = self.dispatch_message(message, timeout).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Sends an already encoded message, returning the raw response body.
    pub async fn dispatch_message(&self, mut message: WireMessage, timeout: Duration) -> Result<Value> {
        self.metrics.total_inc();
        let _inflight = InflightGuard::new(self.metrics.as_ref());

        if message.header.request_id.is_none() {
            message.header.request_id = Some(Uuid::new_v4());
        }
        if message.header.timeout_ms.is_none() {
            message.header.timeout_ms = Some(timeout.as_millis() as u64);
        }

        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut tried: Vec<Arc<Endpoint>> = Vec::with_capacity(max_attempts);
        let mut backoff_ms = self.config.retry.initial_backoff_ms;
        let mut attempt = 0;
        let mut last_error: Option<YtError> = None;

        loop {
            attempt += 1;
            let endpoint = match (self.pool.select(&tried), last_error.take()) {
                (Some(endpoint), previous) => {
                    if previous.is_some() {
                        self.metrics.failover_inc();
                    }
                    endpoint
                }
                (None, Some(last)) => {
                    warn!(
                        "Request {} has no endpoint left after {} attempt(s)",
                        message.header.method,
                        attempt - 1
                    );
                    return Err(YtError::RetryBudgetExhausted {
                        attempts: attempt - 1,
                        last: Box::new(last),
                    });
                }
                (None, None) => return Err(YtError::NoEndpoints),
            };

            message.header.retry = attempt > 1;
            self.metrics.endpoint_request(endpoint.addr());
            debug!(
                endpoint = %endpoint.addr(),
                method = %message.header.method,
                attempt,
                "Sending request"
            );

            let started = Instant::now();
            let error = match self.send_attempt(&endpoint, &message, timeout).await {
                Ok(body) => {
                    endpoint.record_success(started.elapsed());
                    return Ok(body);
                }
                Err(e) => e,
            };

            if !error.is_recoverable() {
                debug!(endpoint = %endpoint.addr(), "Request rejected: {}", error);
                return Err(error);
            }

            let failures = endpoint.record_failure();
            self.pool
                .mark_unhealthy(&endpoint, self.config.cooldown.calculate_cooldown(failures));

            if attempt >= max_attempts {
                warn!(
                    "Request {} failed on {} (attempt {}/{}): {}, giving up",
                    message.header.method,
                    endpoint.addr(),
                    attempt,
                    max_attempts,
                    error
                );
                return Err(YtError::RetryBudgetExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            warn!(
                "Request {} failed on {} (attempt {}/{}): {}, failing over in {}ms",
                message.header.method,
                endpoint.addr(),
                attempt,
                max_attempts,
                error,
                backoff_ms
            );

            if !tried.iter().any(|t| t.addr() == endpoint.addr()) {
                tried.push(endpoint);
            }
            last_error = Some(error);
            if backoff_ms > 0 {
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            backoff_ms = std::cmp::min(
                (backoff_ms as f64 * self.config.retry.backoff_multiplier) as u64,
                self.config.retry.max_backoff_ms,
            );
        }
    }

    async fn send_attempt(&self, endpoint: &Arc<Endpoint>, message: &WireMessage, timeout: Duration) -> Result<Value> {
        let _request = endpoint.begin_request();
        match tokio::time::timeout(timeout, self.transport.send(endpoint, message)).await {
            Ok(response) => response?.into_result(),
            Err(_) => Err(RecoverableError::Timeout(timeout.as_millis() as u64).into()),
        }
    }
}
