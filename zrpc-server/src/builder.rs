//! Server builder
//!
//! Fluent configuration of a [`ZrpcServer`]: the endpoint to bind, the
//! methods to serve, batch execution, and observability.
//!
//! # Examples
//!
//! ```rust,no_run
//! use zrpc_server::{from_fn, BatchMode, ParamsSpec, ZrpcServer};
//!
//! # async fn example() -> zrpc_core::Result<()> {
//! let server = ZrpcServer::builder()
//!     .bind("tcp://127.0.0.1:10000")
//!     .handler_with_spec("echo", ParamsSpec::Required, from_fn(|p| async move {
//!         Ok(p.into_value().unwrap_or_default())
//!     }))
//!     .batch_mode(BatchMode::Parallel)
//!     .max_batch_size(100)
//!     .build()
//!     .await?;
//!
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    BatchMode, BatchProcessor, Engine, Handler, ParamsSpec, ReplyTransport, Router,
    ServerConfig, ServerMetrics, ZmqReplyTransport, ZrpcServer,
};
use std::sync::Arc;
use zrpc_core::{Error, ObservabilityConfig, Result};

pub struct ServerBuilder {
    bind: Option<String>,
    router: Router,
    batch_mode: BatchMode,
    max_batch_size: Option<usize>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            bind: None,
            router: Router::new(),
            batch_mode: BatchMode::default(),
            max_batch_size: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Apply bind endpoint, batch settings and observability from a config
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut builder = Self::new().bind(config.bind.clone()).batch_mode(config.batch_mode);
        builder.max_batch_size = config.max_batch_size;
        if config.observability {
            builder = builder.with_default_observability();
        }
        builder
    }

    /// ZeroMQ endpoint for the REP socket, e.g. `tcp://127.0.0.1:10000`
    pub fn bind(mut self, endpoint: impl Into<String>) -> Self {
        self.bind = Some(endpoint.into());
        self
    }

    pub fn handler(mut self, method: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        self.router.register(method, handler);
        self
    }

    pub fn handler_with_spec(
        mut self,
        method: impl Into<String>,
        spec: ParamsSpec,
        handler: Box<dyn Handler>,
    ) -> Self {
        self.router.register_with_spec(method, spec, handler);
        self
    }

    /// Replace the method registry, dropping handlers registered so far
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    pub fn max_batch_size(mut self, max_size: usize) -> Self {
        self.max_batch_size = Some(max_size);
        self
    }

    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Service name reported by telemetry; overrides the observability config
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the engine alone, without binding anything
    pub fn build_engine(self) -> Result<Engine> {
        if self.max_batch_size == Some(0) {
            return Err(Error::Config("max_batch_size must be at least 1".to_string()));
        }

        let metrics = match self.observability_config {
            Some(mut config) => {
                if let Some(name) = self.service_name {
                    config.service_name = name;
                }
                zrpc_core::init_observability(config.clone()).map_err(|e| {
                    Error::Internal(format!("Failed to initialize observability: {}", e))
                })?;
                Some(Arc::new(ServerMetrics::new(&config.service_name)))
            }
            None => None,
        };

        let processor = BatchProcessor::with_limit(self.batch_mode, self.max_batch_size);
        Ok(Engine::with_batch_processor(self.router, processor).with_metrics(metrics))
    }

    /// Bind the ZeroMQ REP socket and build the server
    pub async fn build(mut self) -> Result<ZrpcServer> {
        let endpoint = self
            .bind
            .take()
            .ok_or_else(|| Error::Config("No bind endpoint specified".to_string()))?;

        let engine = self.build_engine()?;
        let transport = ZmqReplyTransport::bind(&endpoint).await?;
        tracing::info!(endpoint = %transport.local_endpoint(), "Server bound");

        Ok(ZrpcServer::with_transport(engine, transport))
    }

    /// Build the server on a caller-supplied transport
    pub fn build_with_transport<T: ReplyTransport>(self, transport: T) -> Result<ZrpcServer<T>> {
        Ok(ZrpcServer::with_transport(self.build_engine()?, transport))
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;

    #[tokio::test]
    async fn test_builder_binds_ephemeral_port() {
        let server = ServerBuilder::new()
            .bind("tcp://127.0.0.1:0")
            .handler("ping", from_fn(|_| async { Ok(serde_json::json!("pong")) }))
            .build()
            .await
            .unwrap();

        assert!(server.router().has_method("ping"));
        let endpoint = server.local_endpoint();
        assert!(endpoint.starts_with("tcp://127.0.0.1:"));
        assert!(!endpoint.ends_with(":0"));
    }

    #[tokio::test]
    async fn test_builder_without_endpoint() {
        let result = ServerBuilder::new().build().await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_builder_bad_endpoint() {
        let result = ServerBuilder::new().bind("not-an-endpoint").build().await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn test_builder_batch_settings() {
        let engine = ServerBuilder::new()
            .batch_mode(BatchMode::Parallel)
            .max_batch_size(50)
            .build_engine()
            .unwrap();
        assert_eq!(engine.batch_processor().mode(), BatchMode::Parallel);
        assert_eq!(engine.batch_processor().max_size(), Some(50));

        assert!(ServerBuilder::new().max_batch_size(0).build_engine().is_err());
    }

    #[test]
    fn test_builder_from_config() {
        let config = ServerConfig {
            max_batch_size: Some(8),
            ..ServerConfig::default()
        };
        let engine = ServerBuilder::from_config(&config).build_engine().unwrap();
        assert_eq!(engine.batch_processor().mode(), BatchMode::Sequential);
        assert_eq!(engine.batch_processor().max_size(), Some(8));
    }

    #[test]
    fn test_router_replaces_registered_handlers() {
        let mut router = Router::new();
        router.register("a", from_fn(|_| async { Ok(serde_json::json!(1)) }));

        let engine = ServerBuilder::new()
            .handler("b", from_fn(|_| async { Ok(serde_json::json!(2)) }))
            .router(router)
            .build_engine()
            .unwrap();
        assert_eq!(engine.router().methods(), vec!["a".to_string()]);
    }
}
