//! Core JSON-RPC 2.0 building blocks for zrpc
//!
//! zrpc serves JSON-RPC 2.0 over a ZeroMQ REQ/REP socket pair. This crate
//! holds the transport-independent pieces shared by the server and the
//! client:
//!
//! - **Types**: ids, params, requests, notifications, responses, replies
//! - **Codec**: bytes to JSON and replies to bytes
//! - **Validate**: envelope checks that turn JSON into calls or Invalid Request errors
//! - **Error handling**: the crate error type and the wire error object
//! - **Observability**: log subscriber and OpenTelemetry pipeline setup
//!
//! # Pipeline
//!
//! An inbound frame goes through `codec::decode` (Parse error on failure),
//! then `validate::classify` (single call, batch or empty batch). The server
//! crate dispatches the resulting calls and hands a [`Reply`] back to
//! `codec::encode_reply`.
//!
//! # Example
//!
//! ```rust
//! use zrpc_core::{codec, validate, Id};
//!
//! let value = codec::decode(br#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#).unwrap();
//! match validate::classify(value) {
//!     validate::Incoming::Single(Ok(call)) => {
//!         assert_eq!(call.method(), "subtract");
//!         assert_eq!(call.id(), Some(&Id::from(1i64)));
//!     }
//!     _ => unreachable!(),
//! }
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;
pub mod validate;

pub use error::{Error, JsonRpcErrorData, Result};
pub use observability::{
    init_logging, init_observability, shutdown_observability, ObservabilityConfig,
};
pub use types::{
    Id, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Params, Reply, JSONRPC_VERSION,
};
pub use validate::{Call, Incoming, InvalidCall};
