//! Wire codec
//!
//! ZeroMQ delivers whole messages as byte frames, so the codec works on
//! bytes rather than strings:
//!
//! - [`decode`] turns a frame into a `serde_json::Value`, or a Parse error
//! - [`encode_reply`] turns a [`Reply`] into a frame
//!
//! Decoding deliberately stops at "is this JSON". Whether the value is a
//! well-formed call is the job of [`crate::validate`]; keeping the two apart
//! is what lets a batch report per-item Invalid Request errors.
//!
//! An empty frame is not JSON. It is the transport's encoding of "no reply"
//! and is handled by the callers before anything reaches this module.
//!
//! # Examples
//!
//! ```rust
//! use zrpc_core::{codec, Id, JsonRpcResponse, Reply};
//! use serde_json::json;
//!
//! let value = codec::decode(br#"{"jsonrpc":"2.0","method":"echo","params":[1],"id":1}"#).unwrap();
//! assert!(value.is_object());
//!
//! let reply = Reply::Single(JsonRpcResponse::success(json!([1]), Id::from(1i64)));
//! let bytes = codec::encode_reply(&reply).unwrap();
//! assert_eq!(bytes, br#"{"jsonrpc":"2.0","result":[1],"id":1}"#);
//! ```

use crate::error::{Error, JsonRpcErrorData, Result};
use crate::types::{JsonRpcNotification, JsonRpcRequest, Reply};
use serde::Serialize;
use serde_json::Value;

/// Encode any serializable message to bytes
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode a frame into a JSON value
///
/// Any failure (syntax error, truncation, invalid UTF-8, trailing garbage)
/// is reported as `Error::JsonRpc` carrying the Parse error object.
pub fn decode(data: &[u8]) -> Result<Value> {
    serde_json::from_slice(data).map_err(|e| {
        tracing::debug!(error = %e, "Failed to parse incoming payload");
        Error::JsonRpc(JsonRpcErrorData::parse_error())
    })
}

/// Encode a reply message
pub fn encode_reply(reply: &Reply) -> Result<Vec<u8>> {
    encode(reply)
}

pub fn encode_request(req: &JsonRpcRequest) -> Result<Vec<u8>> {
    encode(req)
}

pub fn encode_notification(notif: &JsonRpcNotification) -> Result<Vec<u8>> {
    encode(notif)
}

/// Decode a reply frame received by a client
///
/// Returns `Ok(None)` for the empty frame.
pub fn decode_reply(data: &[u8]) -> Result<Option<Reply>> {
    if data.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(data)
        .map(Some)
        .map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Id, JsonRpcResponse, Params};
    use serde_json::json;

    fn parse_error_code(result: Result<Value>) -> i32 {
        match result {
            Err(Error::JsonRpc(data)) => data.code,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_valid() {
        let value = decode(br#"[1, 2, 3]"#).unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn test_decode_malformed_inputs() {
        let cases: [&[u8]; 5] = [
            br#"{"jsonrpc": "2.0", "method": "foobar, "params": "bar", "baz]"#,
            br#"[{"jsonrpc": "2.0", "method": "sum", "params": [1,2,4], "id": "1"},{"jsonrpc": "2.0", "method""#,
            b"",
            b"{\"a\": \xff}",
            b"{} trailing",
        ];
        for case in cases {
            assert_eq!(parse_error_code(decode(case)), -32700);
        }
    }

    #[test]
    fn test_encode_reply_single() {
        let reply = Reply::Single(JsonRpcResponse::error(JsonRpcErrorData::parse_error(), Id::Null));
        let bytes = encode_reply(&reply).unwrap();
        assert_eq!(
            bytes,
            br#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"},"id":null}"#
        );
    }

    #[test]
    fn test_encode_reply_batch_keeps_order_and_id_types() {
        let reply = Reply::Batch(vec![
            JsonRpcResponse::success(json!(7), Id::from("1")),
            JsonRpcResponse::success(json!(19), Id::from(2i64)),
        ]);
        let value: Value = serde_json::from_slice(&encode_reply(&reply).unwrap()).unwrap();
        assert_eq!(value[0]["id"], json!("1"));
        assert_eq!(value[1]["id"], json!(2));
    }

    #[test]
    fn test_encode_request_omits_absent_params() {
        let req = JsonRpcRequest::new("counter", Params::None, Id::from(9i64));
        let value: Value = serde_json::from_slice(&encode_request(&req).unwrap()).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "method": "counter", "id": 9}));
    }

    #[test]
    fn test_decode_reply_empty_frame() {
        assert!(decode_reply(b"").unwrap().is_none());
        let reply = decode_reply(br#"[{"jsonrpc":"2.0","result":1,"id":1}]"#).unwrap().unwrap();
        assert!(reply.is_batch());
    }
}
