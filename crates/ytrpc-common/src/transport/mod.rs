//! Framing for proxy connections.
//!
//! - **Codec**: JSON serialization of [`WireMessage`](crate::protocol::WireMessage)
//!   and [`RpcResponse`](crate::protocol::RpcResponse)
//! - **Wire Format**: `[4-byte length prefix as u32 big-endian] + [JSON data]`
//!
//! # Components
//!
//! - **[`JsonCodec`]**: Encode/decode frames
//! - **[`TcpTransportAsync`]**: Async TCP connect/send/receive with size limits

pub mod codec;
pub mod tcp;

pub use codec::JsonCodec;
pub use tcp::{TcpTransportAsync, TcpTransportConfig};
