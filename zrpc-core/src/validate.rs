//! Envelope validation
//!
//! Turns a decoded JSON value into well-formed calls, or into the Invalid
//! Request error that must be sent back for it.
//!
//! The checks run in a fixed order for each object:
//!
//! 1. `jsonrpc` must be exactly `"2.0"`
//! 2. `method` must be a string
//! 3. `id`, when present, must be a string, a number or `null`
//! 4. `params`, when present, must be an array or an object
//!
//! Errors from steps 1 to 3 carry `id: null`; only a `params` error echoes
//! the id that passed step 3. A malformed envelope is always answered, even when it has no
//! `id`: the sender's intent cannot be known, so the error goes out with
//! `id: null`.
//!
//! # Examples
//!
//! ```rust
//! use zrpc_core::validate::{classify, Incoming};
//! use serde_json::json;
//!
//! match classify(json!({"jsonrpc": "2.0", "method": "update", "params": [1]})) {
//!     Incoming::Single(Ok(call)) => assert!(call.is_notification()),
//!     _ => unreachable!(),
//! }
//! ```

use crate::error::JsonRpcErrorData;
use crate::types::{Id, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Params, JSONRPC_VERSION};
use serde_json::{Map, Value};

/// A call that passed envelope validation
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

impl Call {
    pub fn method(&self) -> &str {
        match self {
            Call::Request(req) => &req.method,
            Call::Notification(notif) => &notif.method,
        }
    }

    /// Id to answer with; `None` for notifications
    pub fn id(&self) -> Option<&Id> {
        match self {
            Call::Request(req) => Some(&req.id),
            Call::Notification(_) => None,
        }
    }

    pub fn is_notification(&self) -> bool {
        matches!(self, Call::Notification(_))
    }

    /// Split the call into its parts
    pub fn into_parts(self) -> (String, Params, Option<Id>) {
        match self {
            Call::Request(req) => (req.method, req.params, Some(req.id)),
            Call::Notification(notif) => (notif.method, notif.params, None),
        }
    }
}

/// An envelope that failed validation, with the id to answer with
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidCall {
    pub id: Id,
    pub error: JsonRpcErrorData,
}

impl InvalidCall {
    fn new(id: Id, detail: &str) -> Self {
        Self {
            id,
            error: JsonRpcErrorData::invalid_request(detail),
        }
    }

    pub fn into_response(self) -> JsonRpcResponse {
        JsonRpcResponse::error(self.error, self.id)
    }
}

/// Shape of a decoded message
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A single object (or a scalar, which is always invalid)
    Single(Result<Call, InvalidCall>),
    /// A non-empty array; items are validated one by one
    Batch(Vec<Value>),
    /// `[]`, answered with a single Invalid Request
    EmptyBatch,
}

/// Classify a decoded top-level value
pub fn classify(value: Value) -> Incoming {
    match value {
        Value::Array(items) if items.is_empty() => Incoming::EmptyBatch,
        Value::Array(items) => Incoming::Batch(items),
        other => Incoming::Single(validate_call(other)),
    }
}

/// The error answering `[]`
pub fn empty_batch_error() -> InvalidCall {
    InvalidCall::new(Id::Null, "batch MUST contain at least one call")
}

/// Validate a single call envelope
///
/// Arrays are rejected here; inside a batch a nested array is just another
/// invalid element.
pub fn validate_call(value: Value) -> Result<Call, InvalidCall> {
    let mut object = match value {
        Value::Object(object) => object,
        _ => return Err(InvalidCall::new(Id::Null, "call MUST be an Object")),
    };

    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(InvalidCall::new(
            Id::Null,
            "\"jsonrpc\" MUST be exactly \"2.0\"",
        ));
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(InvalidCall::new(Id::Null, "\"method\" MUST be a String")),
    };

    // The id is only trusted once the envelope is known to be 2.0.
    let id = match object.remove("id") {
        None => None,
        Some(raw) => match Id::from_value(raw) {
            Some(id) => Some(id),
            None => {
                return Err(InvalidCall::new(
                    Id::Null,
                    "\"id\" MUST contain a String, Number, or NULL value if included",
                ))
            }
        },
    };

    let params = match take_params(&mut object) {
        Some(params) => params,
        None => {
            return Err(InvalidCall::new(
                id.unwrap_or(Id::Null),
                "\"params\" MUST be Array or Object if included",
            ))
        }
    };

    Ok(match id {
        Some(id) => Call::Request(JsonRpcRequest::new(method, params, id)),
        None => Call::Notification(JsonRpcNotification::new(method, params)),
    })
}

fn take_params(object: &mut Map<String, Value>) -> Option<Params> {
    match object.remove("params") {
        None => Some(Params::None),
        Some(Value::Array(items)) => Some(Params::Positional(items)),
        Some(Value::Object(members)) => Some(Params::Named(members)),
        Some(_) => None,
    }
}

/// Validate every element of a non-empty batch, keeping order
pub fn validate_batch(items: Vec<Value>) -> Vec<Result<Call, InvalidCall>> {
    items.into_iter().map(validate_call).collect()
}
