//! JSON-RPC 2.0 client over ZeroMQ REQ/REP
//!
//! The counterpart of `zrpc-server`: a REQ socket that sends requests,
//! notifications and batches and reads back the single reply message each
//! of them gets.
//!
//! # Core Features
//!
//! - **Typed requests**: serialize params and deserialize results with serde
//! - **Notifications**: fire-and-forget calls, acknowledged by an empty frame
//! - **Batch Requests**: ordered batches with lookup of responses by id
//! - **Raw access**: send arbitrary bytes, for probing a server's error handling
//! - **Observability**: `tracing` spans and optional OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use zrpc_client::ZrpcClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ZrpcClient::connect("tcp://127.0.0.1:10000").await?;
//!
//!     let difference: i64 = client.request("subtract", json!([42, 23])).await?;
//!     assert_eq!(difference, 19);
//!
//!     client.notify("update", json!([1, 2, 3, 4, 5])).await?;
//!     Ok(())
//! }
//! ```
//!
//! Reconnection and request retries are not provided: a REQ socket that
//! lost its peer mid-request has to be replaced by a new client.

mod batch;
mod client;
mod metrics;

pub use batch::{BatchRequest, BatchResponse};
pub use client::ZrpcClient;
pub use metrics::ClientMetrics;
