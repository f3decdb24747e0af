//! Wire messages exchanged with RPC proxies.
//!
//! These mirror the proxy API schema field by field. Request bodies are
//! filled by the client's request types; the header carries the options that
//! every call shares.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::protocol::error::{Result, YtError};

/// Name of the proxy service every API method lives in.
pub const API_SERVICE: &str = "ApiService";

/// Per-call header.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestHeader {
    pub service: String,
    pub method: String,
    pub request_id: Option<Uuid>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub trace_id: Option<Uuid>,
    pub trace_sampled: bool,
    /// Set on every attempt after the first one.
    pub retry: bool,
    pub additional_data: Option<Value>,
}

/// Header plus a typed body; what request types write into.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WireRequest<B> {
    pub header: RequestHeader,
    pub body: B,
}

/// Encoded form of a request as handed to a transport.
pub type WireMessage = WireRequest<Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MutatingOptions {
    pub mutation_id: Option<Uuid>,
    pub retry: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TabletRangeOptions {
    pub first_tablet_index: Option<i32>,
    pub last_tablet_index: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReqMountTable {
    pub path: String,
    pub mutating_options: Option<MutatingOptions>,
    pub tablet_range_options: Option<TabletRangeOptions>,
    pub cell_id: Option<Uuid>,
    pub freeze: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReqUnmountTable {
    pub path: String,
    pub mutating_options: Option<MutatingOptions>,
    pub tablet_range_options: Option<TabletRangeOptions>,
    pub force: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReqRemountTable {
    pub path: String,
    pub mutating_options: Option<MutatingOptions>,
    pub tablet_range_options: Option<TabletRangeOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReqLockNode {
    pub path: String,
    /// Protocol code of the lock mode.
    pub mode: i32,
    pub waitable: bool,
    pub child_key: Option<String>,
    pub attribute_key: Option<String>,
    pub mutating_options: Option<MutatingOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReqStartOperation {
    pub operation_type: String,
    pub spec: Value,
    pub mutating_options: Option<MutatingOptions>,
}

/// Response body of calls that return nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RspEmpty {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RspLockNode {
    pub lock_id: Uuid,
    pub node_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RspStartOperation {
    pub operation_id: Uuid,
}

/// Server-side error attached to a response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// A proxy's reply to one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcResponse {
    pub request_id: Option<Uuid>,
    pub body: Option<Value>,
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(request_id: Option<Uuid>, body: Value) -> Self {
        Self {
            request_id,
            body: Some(body),
            error: None,
        }
    }

    pub fn error(request_id: Option<Uuid>, code: i32, message: impl Into<String>) -> Self {
        Self {
            request_id,
            body: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Splits the response into its body or a classified error.
    ///
    /// A success without a body is an empty object, which is what
    /// methods returning nothing send.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(YtError::from_server(error.code, error.message)),
            None => Ok(self.body.unwrap_or_else(|| Value::Object(Default::default()))),
        }
    }
}
