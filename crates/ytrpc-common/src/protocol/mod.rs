pub mod error;
pub mod wire;


pub use error::{RecoverableError, Result, YtError};
pub use wire::{RequestHeader, RpcError, RpcResponse, WireMessage, WireRequest};
