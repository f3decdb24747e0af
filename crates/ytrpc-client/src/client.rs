use std::sync::Arc;

use uuid::Uuid;
use ytrpc_common::protocol::wire::RspLockNode;
use ytrpc_common::transport::TcpTransportConfig;
use ytrpc_common::Result;

use crate::dispatcher::{BalancingDispatcher, DispatchConfig};
use crate::pool::EndpointPool;
use crate::request::{LockNode, MountTable, Operation, RemountTable, Request, StartMerge, UnmountTable};
use crate::transport::TcpRpcTransport;

/// Settings of a [`YtClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Sent with every request that does not set its own user agent.
    pub user_agent: Option<String>,
    pub dispatch: DispatchConfig,
    pub transport: TcpTransportConfig,
}

/// ytrpc client for making API calls
///
/// Typed front end over a [`BalancingDispatcher`]. Clones share the
/// dispatcher, its endpoint pool and their health state.
///
/// # Example
///
/// ```no_run
/// use ytrpc_client::request::LockNode;
/// use ytrpc_client::YtClient;
/// use ytrpc_common::{LockMode, YPath};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = YtClient::new(vec!["proxy-1:9013".to_string(), "proxy-2:9013".to_string()]);
///
/// let lock = client
///     .lock_node(&LockNode::new(YPath::new("//home/config")?, LockMode::Shared))
///     .await?;
/// println!("lock {}", lock.lock_id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct YtClient {
    dispatcher: Arc<BalancingDispatcher>,
    user_agent: Option<String>,
}

impl YtClient {
    /// Create a new client balancing over `proxies`
    pub fn new(proxies: Vec<String>) -> Self {
        Self::with_config(proxies, ClientConfig::default())
    }

    pub fn with_config(proxies: Vec<String>, config: ClientConfig) -> Self {
        let pool = Arc::new(EndpointPool::new(proxies));
        let transport = Arc::new(TcpRpcTransport::new(config.transport));
        let dispatcher = BalancingDispatcher::with_config(pool, transport, config.dispatch);
        Self::from_dispatcher(Arc::new(dispatcher), config.user_agent)
    }

    /// Wraps an existing dispatcher, e.g. one with a custom transport or metrics sink.
    pub fn from_dispatcher(dispatcher: Arc<BalancingDispatcher>, user_agent: Option<String>) -> Self {
        Self {
            dispatcher,
            user_agent,
        }
    }

    pub fn dispatcher(&self) -> &Arc<BalancingDispatcher> {
        &self.dispatcher
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        self.dispatcher.pool()
    }

    pub async fn mount_table(&self, request: &Request<MountTable>) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    pub async fn unmount_table(&self, request: &Request<UnmountTable>) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    pub async fn remount_table(&self, request: &Request<RemountTable>) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    pub async fn lock_node(&self, request: &Request<LockNode>) -> Result<RspLockNode> {
        self.execute(request).await
    }

    /// Starts a merge and returns the operation id.
    pub async fn start_merge(&self, request: &Request<StartMerge>) -> Result<Uuid> {
        Ok(self.execute(request).await?.operation_id)
    }

    /// Dispatches any request, filling in the client's user agent if the request has none.
    pub async fn execute<O: Operation>(&self, request: &Request<O>) -> Result<O::Response> {
        match &self.user_agent {
            Some(user_agent) if request.options().user_agent().is_none() => {
                let request = request.to_builder().with_user_agent(user_agent.clone()).build()?;
                self.dispatcher.dispatch(&request).await
            }
            _ => self.dispatcher.dispatch(request).await,
        }
    }
}
