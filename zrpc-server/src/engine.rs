//! Request engine
//!
//! The engine is the whole JSON-RPC pipeline for one inbound message,
//! independent of any socket:
//!
//! ```text
//! bytes ─ decode ─ classify ─┬─ single ─ dispatch ───────────┬─ Reply ─ encode ─ bytes
//!                            ├─ batch ── BatchProcessor ─────┤
//!                            └─ [] ───── Invalid Request ────┘
//! ```
//!
//! Each message yields either one [`Reply`] or nothing at all. Nothing
//! happens for a lone notification or for a batch made only of
//! notifications.
//!
//! # Examples
//!
//! ```rust
//! use zrpc_server::{from_fn, Engine, Router};
//!
//! # async fn example() -> zrpc_core::Result<()> {
//! let mut router = Router::new();
//! router.register("ping", from_fn(|_| async { Ok(serde_json::json!("pong")) }));
//! let engine = Engine::new(router);
//!
//! let reply = engine.handle_bytes(br#"{"jsonrpc":"2.0","method":"ping","id":1}"#).await?;
//! assert_eq!(reply.unwrap(), br#"{"jsonrpc":"2.0","result":"pong","id":1}"#);
//!
//! let none = engine.handle_bytes(br#"{"jsonrpc":"2.0","method":"ping"}"#).await?;
//! assert!(none.is_none());
//! # Ok(())
//! # }
//! ```

use crate::batch::BatchProcessor;
use crate::dispatch::Dispatcher;
use crate::metrics::ServerMetrics;
use crate::router::Router;
use std::sync::Arc;
use zrpc_core::{codec, validate, Error, Id, Incoming, JsonRpcResponse, Reply, Result};

/// The JSON-RPC pipeline for one message at a time
#[derive(Clone)]
pub struct Engine {
    dispatcher: Dispatcher,
    batch_processor: BatchProcessor,
}

impl Engine {
    /// Engine with the default batch processor (sequential, unlimited)
    pub fn new(router: Router) -> Self {
        Self::with_batch_processor(router, BatchProcessor::default())
    }

    pub fn with_batch_processor(router: Router, batch_processor: BatchProcessor) -> Self {
        Self {
            dispatcher: Dispatcher::new(router),
            batch_processor,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<ServerMetrics>>) -> Self {
        self.dispatcher = self.dispatcher.with_metrics(metrics);
        self
    }

    pub fn router(&self) -> &Router {
        self.dispatcher.router()
    }

    pub fn batch_processor(&self) -> &BatchProcessor {
        &self.batch_processor
    }

    /// Process one message and return the reply to send, if any
    #[tracing::instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub async fn handle(&self, payload: &[u8]) -> Option<Reply> {
        let value = match codec::decode(payload) {
            Ok(value) => value,
            Err(e) => {
                let error = e.to_error_data();
                if let Some(metrics) = self.dispatcher.metrics() {
                    metrics.record_error(error.code);
                }
                return Some(Reply::Single(JsonRpcResponse::error(error, Id::Null)));
            }
        };

        let reply = match validate::classify(value) {
            Incoming::Single(call) => self.dispatcher.dispatch(call).await.map(Reply::Single),
            Incoming::EmptyBatch => Some(Reply::Single(
                validate::empty_batch_error().into_response(),
            )),
            Incoming::Batch(items) => {
                match self
                    .batch_processor
                    .process_batch(items, &self.dispatcher)
                    .await
                {
                    Ok(responses) => (!responses.is_empty()).then_some(Reply::Batch(responses)),
                    Err(e) => {
                        let error = e.to_error_data();
                        if let Some(metrics) = self.dispatcher.metrics() {
                            metrics.record_error(error.code);
                        }
                        Some(Reply::Single(JsonRpcResponse::error(error, Id::Null)))
                    }
                }
            }
        };

        if let Some(metrics) = self.dispatcher.metrics() {
            metrics.record_message(reply.is_some());
        }
        reply
    }

    /// Process one message as bytes
    ///
    /// `Ok(None)` means nothing is to be sent back.
    pub async fn handle_bytes(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.handle(payload).await {
            Some(reply) => codec::encode_reply(&reply).map(Some),
            None => Ok(None),
        }
    }
}

/// Bytes of an Internal error reply, for when a reply itself cannot be encoded
pub(crate) fn encoding_failure(error: &Error) -> Vec<u8> {
    let reply = Reply::Single(JsonRpcResponse::error(
        zrpc_core::JsonRpcErrorData::internal_error(error.to_string()),
        Id::Null,
    ));
    codec::encode_reply(&reply).unwrap_or_else(|_| {
        br#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"},"id":null}"#
            .to_vec()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use serde_json::{json, Value};

    fn engine() -> Engine {
        let mut router = Router::new();
        router.register(
            "echo",
            from_fn(|p| async move { Ok(p.into_value().unwrap_or_default()) }),
        );
        Engine::new(router)
    }

    async fn reply_value(payload: &[u8]) -> Option<Value> {
        engine()
            .handle_bytes(payload)
            .await
            .unwrap()
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_parse_error() {
        let reply = reply_value(br#"{"jsonrpc": "2.0", "method": "foobar, "params": "bar", "baz]"#)
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], json!(-32700));
        assert_eq!(reply["error"]["message"], json!("Parse error"));
        assert_eq!(reply["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_empty_batch_is_single_error() {
        let reply = reply_value(b"[]").await.unwrap();
        assert!(reply.is_object());
        assert_eq!(reply["error"]["code"], json!(-32600));
        assert_eq!(reply["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_scalar_batch_items() {
        let reply = reply_value(b"[1,2,3]").await.unwrap();
        let items = reply.as_array().unwrap();
        assert_eq!(items.len(), 3);
        for item in items {
            assert_eq!(item["error"]["code"], json!(-32600));
            assert_eq!(item["id"], Value::Null);
        }
    }

    #[tokio::test]
    async fn test_notification_has_no_reply() {
        assert!(reply_value(br#"{"jsonrpc":"2.0","method":"echo","params":[1]}"#).await.is_none());
        assert!(reply_value(br#"[{"jsonrpc":"2.0","method":"echo"},{"jsonrpc":"2.0","method":"x"}]"#)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_single_reply_is_not_wrapped() {
        let reply = reply_value(br#"{"jsonrpc":"2.0","method":"echo","params":{"a":1},"id":2.5}"#)
            .await
            .unwrap();
        assert_eq!(reply, json!({"jsonrpc": "2.0", "result": {"a": 1}, "id": 2.5}));
    }

    #[test]
    fn test_encoding_failure_reply() {
        let bytes = encoding_failure(&Error::Serialization("bad float".into()));
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["code"], json!(-32603));
        assert_eq!(value["id"], Value::Null);
    }
}
