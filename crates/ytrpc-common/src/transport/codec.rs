use crate::protocol::error::Result;
use crate::protocol::{RpcResponse, WireMessage};

/// JSON codec for frames exchanged with proxies.
///
/// Both directions are provided so that in-process fake proxies can reuse
/// the exact encoding the client uses.
///
/// # Example
///
/// ```
/// use ytrpc_common::transport::JsonCodec;
/// use ytrpc_common::protocol::RpcResponse;
/// use serde_json::json;
///
/// let response = RpcResponse::success(None, json!({"lock_id": null}));
/// let encoded = JsonCodec::encode_response(&response).unwrap();
/// let decoded = JsonCodec::decode_response(&encoded).unwrap();
/// assert_eq!(response, decoded);
/// ```
pub struct JsonCodec;

impl JsonCodec {
    pub fn encode_request(message: &WireMessage) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(message)?)
    }

    pub fn decode_request(data: &[u8]) -> Result<WireMessage> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn encode_response(response: &RpcResponse) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(response)?)
    }

    pub fn decode_response(data: &[u8]) -> Result<RpcResponse> {
        Ok(serde_json::from_slice(data)?)
    }
}
