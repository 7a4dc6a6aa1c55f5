//! Error types for zrpc
//!
//! Two layers of errors live here:
//!
//! - **Error**: the crate-level error used with `?` throughout zrpc (thiserror)
//! - **JsonRpcErrorData**: the `error` member of a JSON-RPC 2.0 response
//!
//! Every `Error` can be lowered to a `JsonRpcErrorData` with
//! [`Error::to_error_data`], which is how handler failures reach the wire.
//!
//! # Error Codes
//!
//! - `-32700`: Parse error (invalid JSON)
//! - `-32600`: Invalid Request (envelope violation)
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32000 to -32099`: Server error (application defined)
//!
//! # Examples
//!
//! ```rust
//! use zrpc_core::{Error, JsonRpcErrorData};
//!
//! let error = Error::MethodNotFound("foobar".into());
//! assert_eq!(error.to_error_data().code, -32601);
//!
//! let wire = JsonRpcErrorData::server_error(-32001, "Quota exhausted");
//! assert_eq!(wire.code, -32001);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parse error: the payload is not valid JSON
pub const PARSE_ERROR: i32 = -32700;
/// Invalid Request: the JSON is not a valid Request object
pub const INVALID_REQUEST: i32 = -32600;
/// Method not found
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error
pub const INTERNAL_ERROR: i32 = -32603;
/// Upper bound of the server-defined error range
pub const SERVER_ERROR_MAX: i32 = -32000;
/// Lower bound of the server-defined error range
pub const SERVER_ERROR_MIN: i32 = -32099;

/// Result type for zrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error type
///
/// Variants that correspond to a JSON-RPC error code (`InvalidRequest`,
/// `MethodNotFound`, `InvalidParams`, `JsonRpc`) keep that code when lowered
/// with [`Error::to_error_data`]. Everything else becomes an Internal error.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A complete JSON-RPC error object, passed through unchanged
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcErrorData),

    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The ZeroMQ transport failed
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Wrong parameter arity or type for the called method
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration value could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,

    /// Batch exceeds the configured maximum size
    #[error("Batch size limit exceeded: limit={limit}, actual={actual}")]
    BatchSizeExceeded { limit: usize, actual: usize },
}

impl Error {
    /// Lower this error to the wire-format error object
    ///
    /// Server-side failures that have no dedicated JSON-RPC code are reported
    /// as Internal error with the error text in `data`.
    pub fn to_error_data(&self) -> JsonRpcErrorData {
        match self {
            Error::JsonRpc(data) => data.clone(),
            Error::InvalidRequest(msg) => JsonRpcErrorData::invalid_request(msg.clone()),
            Error::MethodNotFound(method) => JsonRpcErrorData::method_not_found(method.clone()),
            Error::InvalidParams(msg) => JsonRpcErrorData::invalid_params(msg.clone()),
            Error::BatchSizeExceeded { limit, actual } => {
                JsonRpcErrorData::batch_size_exceeded(*limit, *actual)
            }
            Error::Internal(msg) => JsonRpcErrorData::internal_error(msg.clone()),
            other => JsonRpcErrorData::internal_error(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// JSON-RPC 2.0 error object
///
/// Serialized as `{"code": ..., "message": ..., "data": ...}` with `data`
/// omitted when absent. The standard constructors use the fixed titles from
/// the JSON-RPC 2.0 specification as `message` and put any detail into
/// `data`, so clients can match on `message` reliably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code
    pub code: i32,
    /// Short description of the error
    pub message: String,
    /// Additional information about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create an error object without data
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error object carrying additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(PARSE_ERROR, "Parse error")
    }

    /// Invalid Request (-32600) with a description of the violation
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::with_data(INVALID_REQUEST, "Invalid Request", serde_json::Value::String(detail.into()))
    }

    /// Method not found (-32601); the method name goes into `data`
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::with_data(METHOD_NOT_FOUND, "Method not found", serde_json::Value::String(method.into()))
    }

    /// Invalid params (-32602)
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::with_data(INVALID_PARAMS, "Invalid params", serde_json::Value::String(detail.into()))
    }

    /// Internal error (-32603)
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::with_data(INTERNAL_ERROR, "Internal error", serde_json::Value::String(detail.into()))
    }

    /// Application-defined server error
    ///
    /// Codes outside `-32099..=-32000` are replaced by `-32000`.
    pub fn server_error(code: i32, message: impl Into<String>) -> Self {
        let code = if (SERVER_ERROR_MIN..=SERVER_ERROR_MAX).contains(&code) {
            code
        } else {
            SERVER_ERROR_MAX
        };
        Self::new(code, message)
    }

    /// Invalid Request raised when a batch is larger than allowed
    pub fn batch_size_exceeded(limit: usize, actual: usize) -> Self {
        Self::with_data(
            INVALID_REQUEST,
            "Invalid Request",
            format!("Batch size limit exceeded: limit={}, actual={}", limit, actual).into(),
        )
    }

    /// Attach (or replace) the `data` member
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether the code lies in the server-defined range
    pub fn is_server_error(&self) -> bool {
        (SERVER_ERROR_MIN..=SERVER_ERROR_MAX).contains(&self.code)
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(data) = &self.data {
            write!(f, ": {}", data)?;
        }
        Ok(())
    }
}

impl std::error::Error for JsonRpcErrorData {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_from_serde() {
        let serde_error = serde_json::from_str::<serde_json::Value>(r#"{"invalid": json"#).unwrap_err();
        let error: Error = serde_error.into();
        match error {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_all_jsonrpc_error_codes() {
        let errors = vec![
            (JsonRpcErrorData::parse_error(), -32700),
            (JsonRpcErrorData::invalid_request("test"), -32600),
            (JsonRpcErrorData::method_not_found("test"), -32601),
            (JsonRpcErrorData::invalid_params("test"), -32602),
            (JsonRpcErrorData::internal_error("test"), -32603),
        ];

        for (error, expected_code) in errors {
            assert_eq!(error.code, expected_code);
            assert!(!error.message.is_empty());
        }
    }

    #[test]
    fn test_standard_messages_are_fixed_titles() {
        assert_eq!(JsonRpcErrorData::parse_error().message, "Parse error");
        assert_eq!(JsonRpcErrorData::invalid_request("x").message, "Invalid Request");

        let not_found = JsonRpcErrorData::method_not_found("foobar");
        assert_eq!(not_found.message, "Method not found");
        assert_eq!(not_found.data, Some(json!("foobar")));
    }

    #[test]
    fn test_server_error_range() {
        assert_eq!(JsonRpcErrorData::server_error(-32050, "busy").code, -32050);
        assert_eq!(JsonRpcErrorData::server_error(-32099, "edge").code, -32099);
        assert_eq!(JsonRpcErrorData::server_error(-1, "out of range").code, -32000);
        assert!(JsonRpcErrorData::server_error(-32001, "x").is_server_error());
        assert!(!JsonRpcErrorData::internal_error("x").is_server_error());
    }

    #[test]
    fn test_batch_size_exceeded_creation() {
        let error = JsonRpcErrorData::batch_size_exceeded(100, 150);
        assert_eq!(error.code, -32600);
        let data = error.data.unwrap();
        assert!(data.as_str().unwrap().contains("100"));
        assert!(data.as_str().unwrap().contains("150"));
    }

    #[test]
    fn test_to_error_data_mapping() {
        assert_eq!(Error::InvalidParams("arity".into()).to_error_data().code, -32602);
        assert_eq!(Error::MethodNotFound("m".into()).to_error_data().code, -32601);
        assert_eq!(Error::InvalidRequest("r".into()).to_error_data().code, -32600);
        assert_eq!(Error::Serialization("s".into()).to_error_data().code, -32603);
        assert_eq!(Error::Timeout.to_error_data().code, -32603);

        let custom = JsonRpcErrorData::server_error(-32010, "custom");
        assert_eq!(Error::JsonRpc(custom.clone()).to_error_data(), custom);
    }

    #[test]
    fn test_error_display() {
        let error = JsonRpcErrorData::method_not_found("unknownMethod");
        let display = format!("{}", error);
        assert!(display.contains("-32601"));
        assert!(display.contains("Method not found"));
        assert!(display.contains("unknownMethod"));
    }

    #[test]
    fn test_error_serialization_omits_missing_data() {
        let serialized = serde_json::to_string(&JsonRpcErrorData::parse_error()).unwrap();
        assert_eq!(serialized, r#"{"code":-32700,"message":"Parse error"}"#);

        let deserialized: JsonRpcErrorData =
            serde_json::from_str(r#"{"code":-32601,"message":"Method not found"}"#).unwrap();
        assert_eq!(deserialized.code, -32601);
        assert!(deserialized.data.is_none());
    }
}
