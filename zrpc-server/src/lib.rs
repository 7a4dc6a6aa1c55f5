//! JSON-RPC 2.0 server over ZeroMQ REQ/REP
//!
//! This crate provides the request engine and a server loop that feeds it
//! from a ZeroMQ REP socket.
//!
//! # Core Features
//!
//! - **Method Routing**: register handlers by name, optionally with a declared params shape
//! - **Full JSON-RPC 2.0 semantics**: notifications, batches, all standard error codes
//! - **Batch Processing**: sequential (default) or parallel, with an optional size limit
//! - **Panic Isolation**: a panicking handler becomes an Internal error for its call only
//! - **Observability**: `tracing` spans and OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use zrpc_server::{from_typed_fn, ZrpcServer};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Operands { minuend: f64, subtrahend: f64 }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ZrpcServer::builder()
//!         .bind("tcp://127.0.0.1:10000")
//!         .handler("subtract", from_typed_fn(|p: Operands| async move {
//!             Ok(p.minuend - p.subtrahend)
//!         }))
//!         .build()
//!         .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Serving Model
//!
//! A REP socket serves one request at a time: receive, process, reply. The
//! server follows that loop exactly, so calls from different messages never
//! overlap. Within a batch, items overlap only in [`BatchMode::Parallel`].
//!
//! Every received message is answered. When the engine has nothing to say
//! (notifications only), the answer is a zero-length frame.

mod batch;
mod builder;
mod config;
mod dispatch;
mod engine;
mod handler;
mod metrics;
mod params;
mod router;
mod transport;

pub use batch::{BatchMode, BatchProcessor};
pub use builder::ServerBuilder;
pub use config::{ServerConfig, DEFAULT_BIND};
pub use dispatch::Dispatcher;
pub use engine::Engine;
pub use handler::{from_fn, from_typed_fn, AsyncHandler, Handler, HandlerResult};
pub use metrics::ServerMetrics;
pub use params::ParamsSpec;
pub use router::{Router, RouterBuilder};
pub use transport::{ReplyTransport, ZmqReplyTransport};

use zrpc_core::Result;

/// JSON-RPC server bound to a reply transport
pub struct ZrpcServer<T: ReplyTransport = ZmqReplyTransport> {
    engine: Engine,
    transport: T,
}

impl ZrpcServer {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The bound endpoint, with the resolved port
    pub fn local_endpoint(&self) -> &str {
        self.transport.local_endpoint()
    }
}

impl<T: ReplyTransport> ZrpcServer<T> {
    pub fn with_transport(engine: Engine, transport: T) -> Self {
        Self { engine, transport }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn router(&self) -> &Router {
        self.engine.router()
    }

    /// Receive one message, process it and send its answer
    pub async fn serve_one(&mut self) -> Result<()> {
        let request = self.transport.recv().await?;

        let answer = match self.engine.handle_bytes(&request).await {
            Ok(Some(reply)) => reply,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode reply");
                engine::encoding_failure(&e)
            }
        };

        self.transport.send(answer).await
    }

    /// Serve until the transport fails
    #[tracing::instrument(skip(self), name = "server.run")]
    pub async fn run(mut self) -> Result<()> {
        tracing::info!("Starting zrpc server");
        loop {
            if let Err(e) = self.serve_one().await {
                tracing::error!(error = %e, "Transport failed, stopping server");
                return Err(e);
            }
        }
    }
}
