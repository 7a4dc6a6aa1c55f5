//! JSON-RPC 2.0 types
//!
//! These are the data structures from the JSON-RPC 2.0 specification
//! (https://www.jsonrpc.org/specification):
//!
//! 1. **Request**: a call that expects a response, identified by its `id`
//! 2. **Notification**: a call without an `id`; it never gets a response
//! 3. **Response**: the result of a request (success or error)
//! 4. **Reply**: what goes back over the transport, a single response or a batch
//!
//! # Request IDs
//!
//! The `id` is an opaque token chosen by the caller. It is echoed back
//! verbatim with its JSON type intact: string ids stay strings, numeric ids
//! stay numbers (integer or not), and an explicit `null` stays `null`.
//!
//! # Params
//!
//! `params` is either absent, an array (positional) or an object (named).
//! [`Params`] models exactly those three cases.

use crate::error::{Error, JsonRpcErrorData, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// The protocol version literal carried in every message
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request ID
///
/// Serialized untagged, so an `Id` is written exactly as the JSON value it
/// came from. Numbers are kept as `serde_json::Number` so that `7` and `7.5`
/// both round-trip without changing representation.
///
/// # Examples
///
/// ```rust
/// use zrpc_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    String(String),
    Number(Number),
    /// Used when the id of the offending request could not be determined
    Null,
}

impl Id {
    /// Interpret a raw JSON value as an id
    ///
    /// Returns `None` for values a request id may not take (booleans,
    /// arrays, objects).
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Id::String(s)),
            Value::Number(n) => Some(Id::Number(n)),
            Value::Null => Some(Id::Null),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Id::Null)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n.into())
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n.into())
    }
}

/// Parameters of a call
///
/// Absent params, positional params and named params are distinct cases;
/// handlers receive the variant exactly as it was decoded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    /// No `params` member
    #[default]
    None,
    /// `params` is an array
    Positional(Vec<Value>),
    /// `params` is an object
    Named(Map<String, Value>),
}

impl Params {
    /// Build params from any serializable value
    ///
    /// `null` (including `None::<T>`) means no params. Anything that does not
    /// serialize to an array, an object or `null` is rejected because the
    /// protocol only allows structured params.
    pub fn from_serializable<P: Serialize>(params: P) -> Result<Self> {
        match serde_json::to_value(params)? {
            Value::Null => Ok(Params::None),
            Value::Array(items) => Ok(Params::Positional(items)),
            Value::Object(members) => Ok(Params::Named(members)),
            other => Err(Error::InvalidParams(format!(
                "params must be an array or an object, got {}",
                other
            ))),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Params::None)
    }

    /// Number of positional items or named members; zero when absent
    pub fn len(&self) -> usize {
        match self {
            Params::None => 0,
            Params::Positional(items) => items.len(),
            Params::Named(members) => members.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The params as a JSON value, `None` when absent
    pub fn into_value(self) -> Option<Value> {
        match self {
            Params::None => None,
            Params::Positional(items) => Some(Value::Array(items)),
            Params::Named(members) => Some(Value::Object(members)),
        }
    }

    /// Deserialize the params into a typed value
    ///
    /// Absent params deserialize from `null`, which works for `()` and
    /// `Option<T>`. Structs accept both shapes: an object by field name, an
    /// array by field order. Failures are reported as `Error::InvalidParams`.
    pub fn parse<P: DeserializeOwned>(self) -> Result<P> {
        let value = self.into_value().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| Error::InvalidParams(e.to_string()))
    }
}

impl From<Vec<Value>> for Params {
    fn from(items: Vec<Value>) -> Self {
        Params::Positional(items)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(members: Map<String, Value>) -> Self {
        Params::Named(members)
    }
}

/// JSON-RPC 2.0 request message
///
/// A request always carries an `id`, which may be `null`. A call without an
/// `id` member is a [`JsonRpcNotification`].
///
/// # Examples
///
/// ```rust
/// use zrpc_core::{JsonRpcRequest, Id, Params};
/// use serde_json::json;
///
/// let req = JsonRpcRequest::new("subtract", Params::from(vec![json!(42), json!(23)]), Id::from(1i64));
/// assert_eq!(req.jsonrpc, "2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always "2.0"
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Params::is_none")]
    pub params: Params,
    pub id: Id,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Params, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 notification message
///
/// Identical to a request minus the `id`. The server runs the method but
/// never answers, not even with an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Always "2.0"
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Params::is_none")]
    pub params: Params,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response message
///
/// Exactly one of `result` or `error` is set; the constructors enforce this.
/// `id` is the id of the originating request, or `Id::Null` when it could
/// not be determined (parse errors, malformed envelopes).
///
/// Note that a successful `"result": null` deserializes with `result ==
/// None`; use [`JsonRpcResponse::into_result`] rather than inspecting the
/// fields when consuming responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
    pub id: Id,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(result: Value, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(error: JsonRpcErrorData, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Error code, if this is an error response
    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }

    /// Turn the response into the handler's value or its error
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(Error::JsonRpc(error)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// A reply message: what one inbound transport message produces
///
/// A single call yields `Single`; a batch yields `Batch` with one entry per
/// item that produced a response, in input order. When nothing produced a
/// response there is no `Reply` at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Single(JsonRpcResponse),
    Batch(Vec<JsonRpcResponse>),
}

impl Reply {
    pub fn is_batch(&self) -> bool {
        matches!(self, Reply::Batch(_))
    }

    /// All responses carried by the reply, in order
    pub fn into_responses(self) -> Vec<JsonRpcResponse> {
        match self {
            Reply::Single(response) => vec![response],
            Reply::Batch(responses) => responses,
        }
    }
}
