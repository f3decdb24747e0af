use async_trait::async_trait;
use ytrpc_common::protocol::{RpcResponse, WireMessage};
use ytrpc_common::transport::{TcpTransportAsync, TcpTransportConfig};
use ytrpc_common::Result;

use crate::endpoint::Endpoint;

/// Sends one encoded request to one endpoint.
///
/// Implementations report socket-level failures as
/// `YtError::RecoverableDispatch`; server-reported errors travel inside the
/// returned [`RpcResponse`] and are classified by the dispatcher.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: &Endpoint, message: &WireMessage) -> Result<RpcResponse>;
}

/// TCP transport opening a fresh connection for each request.
///
/// No connection state is shared between requests, so concurrent
/// dispatches never contend on a socket.
#[derive(Debug, Clone, Default)]
pub struct TcpRpcTransport {
    tcp: TcpTransportAsync,
}

impl TcpRpcTransport {
    pub fn new(config: TcpTransportConfig) -> Self {
        Self {
            tcp: TcpTransportAsync::new(config),
        }
    }
}

#[async_trait]
impl Transport for TcpRpcTransport {
    async fn send(&self, endpoint: &Endpoint, message: &WireMessage) -> Result<RpcResponse> {
        let mut stream = self.tcp.connect(endpoint.addr()).await?;
        self.tcp.send_request(&mut stream, message).await
    }
}
