//! ytrpc Client
//!
//! Typed request builders and a balancing dispatcher that sends them to a
//! set of RPC proxies, failing over between proxies on transient errors.
//!
//! - [`request`] - requests, builders and the operations they describe
//! - [`BalancingDispatcher`] - failover, retry budget, deadlines, counters
//! - [`EndpointPool`] / [`BalancingPolicy`] - proxy membership, health and selection
//! - [`Transport`] - the seam between the dispatcher and the network
//! - [`YtClient`] - typed calls over a TCP dispatcher

pub mod client;
pub mod dispatcher;
pub mod endpoint;
pub mod policy;
pub mod pool;
pub mod request;
pub mod transport;

pub use client::{ClientConfig, YtClient};
pub use dispatcher::{BalancingDispatcher, DispatchConfig, RetryConfig};
pub use endpoint::{CooldownConfig, Endpoint, EndpointStatus};
pub use policy::{BalancingPolicy, LowestLatency, RoundRobin};
pub use pool::EndpointPool;
pub use request::{Operation, Request, RequestBuilder, RequestOptions};
pub use transport::{TcpRpcTransport, Transport};
