use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::protocol::error::{RecoverableError, Result, YtError};
use crate::protocol::{RpcResponse, WireMessage};
use crate::transport::codec::JsonCodec;

/// Settings for [`TcpTransportAsync`].
///
/// # Default Configuration
///
/// - `connect_timeout`: 5 seconds
/// - `max_message_size`: 100 MB
#[derive(Debug, Clone)]
pub struct TcpTransportConfig {
    /// Time allowed for establishing a connection to one resolved address
    pub connect_timeout: Duration,
    /// Frames larger than this are rejected before allocation
    pub max_message_size: usize,
}

impl Default for TcpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_message_size: 100 * 1024 * 1024,
        }
    }
}

/// Async TCP framing for proxy calls.
///
/// # Wire Protocol
///
/// Messages are sent with a 4-byte length prefix (big-endian u32) followed
/// by the JSON-encoded data:
///
/// ```text
/// [4-byte length] [JSON data]
/// ```
///
/// Socket level failures come back as [`YtError::RecoverableDispatch`], so
/// the dispatcher can fail over to another proxy.
///
/// # Example
///
/// ```no_run
/// use ytrpc_common::transport::TcpTransportAsync;
/// use ytrpc_common::protocol::WireMessage;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = TcpTransportAsync::default();
/// let mut stream = transport.connect("127.0.0.1:9013").await?;
///
/// let message = WireMessage { header: Default::default(), body: json!({}) };
/// let response = transport.send_request(&mut stream, &message).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TcpTransportAsync {
    config: TcpTransportConfig,
}

impl TcpTransportAsync {
    pub fn new(config: TcpTransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TcpTransportConfig {
        &self.config
    }

    /// Connects to a remote endpoint.
    ///
    /// The address may resolve to several socket addresses; each is tried in
    /// turn until one accepts the connection.
    pub async fn connect(&self, addr: &str) -> Result<TcpStream> {
        let socket_addrs = tokio::net::lookup_host(addr).await.map_err(|e| {
            RecoverableError::Connection(format!("Invalid address '{}': {}", addr, e))
        })?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            match tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(socket_addr)).await {
                Ok(Ok(stream)) => {
                    let _ = stream.set_nodelay(true);
                    return Ok(stream);
                }
                Ok(Err(e)) => last_err = Some(e.to_string()),
                Err(_) => {
                    last_err = Some(format!(
                        "connect timed out after {}ms",
                        self.config.connect_timeout.as_millis()
                    ))
                }
            }
        }

        Err(RecoverableError::Connection(format!(
            "Failed to connect to {}: {}",
            addr,
            last_err.unwrap_or_else(|| "no addresses resolved".to_string())
        ))
        .into())
    }

    /// Writes one request frame and reads the response frame.
    pub async fn send_request(&self, stream: &mut TcpStream, message: &WireMessage) -> Result<RpcResponse> {
        let encoded = JsonCodec::encode_request(message)?;
        self.send_message(stream, &encoded).await?;

        let response_data = self.receive_message(stream).await?;
        JsonCodec::decode_response(&response_data)
    }

    /// Sends a message with length prefix.
    ///
    /// Wire format: `[4-byte length as u32 big-endian] + [data]`
    ///
    /// Frames over `max_message_size` are refused before anything is written.
    pub async fn send_message(&self, stream: &mut TcpStream, data: &[u8]) -> Result<()> {
        let too_large = || YtError::MessageTooLarge {
            size: data.len(),
            max: self.config.max_message_size,
        };
        if data.len() > self.config.max_message_size {
            return Err(too_large());
        }
        let len = u32::try_from(data.len()).map_err(|_| too_large())?;

        stream
            .write_all(&len.to_be_bytes())
            .await
            .map_err(|e| Self::map_io_error(e, "writing length prefix"))?;
        stream
            .write_all(data)
            .await
            .map_err(|e| Self::map_io_error(e, "writing data"))?;
        stream
            .flush()
            .await
            .map_err(|e| Self::map_io_error(e, "flushing stream"))?;

        Ok(())
    }

    /// Receives a message with length prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reading the length prefix fails
    /// - Message exceeds `max_message_size`
    /// - Reading the data fails
    pub async fn receive_message(&self, stream: &mut TcpStream) -> Result<Vec<u8>> {
        let mut len_buf = [0u8; 4];
        stream
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| Self::map_io_error(e, "reading length prefix"))?;

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > self.config.max_message_size {
            return Err(RecoverableError::Connection(format!(
                "Message too large: {} bytes (max {} bytes)",
                len, self.config.max_message_size
            ))
            .into());
        }

        let mut buf = vec![0u8; len];
        stream
            .read_exact(&mut buf)
            .await
            .map_err(|e| Self::map_io_error(e, "reading data"))?;

        Ok(buf)
    }

    // Deadlines are enforced by the caller, so every socket error is a connection error here.
    fn map_io_error(err: std::io::Error, context: &str) -> YtError {
        RecoverableError::Connection(format!("{}: {}", context, err)).into()
    }
}
