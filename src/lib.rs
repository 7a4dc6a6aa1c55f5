//! zrpc - JSON-RPC 2.0 over ZeroMQ REQ/REP
//!
//! Convenience crate re-exporting the zrpc sub-crates, plus the
//! demonstration method set served by the `zrpc-server` binary.
//!
//! # Architecture
//!
//! - **zrpc-core**: types, codec, envelope validation, errors, observability
//! - **zrpc-server**: engine, router, batch processing, REP server loop
//! - **zrpc-client**: REQ client with batches and raw access
//!
//! # Quick Start - Server
//!
//! ```rust,no_run
//! use zrpc::ZrpcServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ZrpcServer::builder()
//!         .bind("tcp://127.0.0.1:10000")
//!         .router(zrpc::methods::demo_router())
//!         .build()
//!         .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Client
//!
//! ```rust,no_run
//! use zrpc::ZrpcClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ZrpcClient::connect("tcp://127.0.0.1:10000").await?;
//!     let total: i64 = client.request("sum", serde_json::json!([1, 2, 4])).await?;
//!     assert_eq!(total, 7);
//!     Ok(())
//! }
//! ```

pub mod methods;

pub use zrpc_client as client;
pub use zrpc_core as core;
pub use zrpc_server as server;

pub use zrpc_client::ZrpcClient;
pub use zrpc_server::ZrpcServer;
