//! Batch processing
//!
//! A batch is a non-empty JSON array of calls carried in one message. Every
//! item is validated and dispatched on its own; the reply holds the
//! responses of the items that produced one, in the order the items
//! appeared. Notifications are left out rather than replaced by
//! placeholders.
//!
//! # Batch Modes
//!
//! - **Sequential** (default): items run one after another in array order,
//!   so side effects of item *n* are visible to item *n + 1*
//! - **Parallel**: items run concurrently on the Tokio runtime; the reply
//!   order is still the input order
//!
//! # Size Limiting
//!
//! With a maximum size configured, a larger batch is answered by a single
//! Invalid Request error (`id: null`) and none of its items run.
//!
//! # Examples
//!
//! ```rust
//! use zrpc_server::{BatchMode, BatchProcessor};
//!
//! let processor = BatchProcessor::with_limit(BatchMode::Parallel, Some(100));
//! let sequential = BatchProcessor::new(BatchMode::Sequential);
//! ```

use crate::dispatch::Dispatcher;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use zrpc_core::validate::{Call, InvalidCall};
use zrpc_core::{validate, Error, JsonRpcErrorData, JsonRpcResponse, Result};

/// Execution strategy for batch items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Run items one after another, in array order
    #[default]
    Sequential,
    /// Run items concurrently; replies keep array order
    Parallel,
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchMode::Sequential => write!(f, "sequential"),
            BatchMode::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for BatchMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(BatchMode::Sequential),
            "parallel" => Ok(BatchMode::Parallel),
            other => Err(Error::Config(format!(
                "unknown batch mode '{}', expected 'sequential' or 'parallel'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    mode: BatchMode,
    max_size: Option<usize>,
}

impl BatchProcessor {
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            max_size: None,
        }
    }

    pub fn with_limit(mode: BatchMode, max_size: Option<usize>) -> Self {
        Self { mode, max_size }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Process the items of a non-empty batch
    ///
    /// Returns the responses to send, possibly none. A batch over the size
    /// limit fails as a whole with `Error::BatchSizeExceeded`.
    #[tracing::instrument(skip(self, items, dispatcher), fields(batch_size = items.len(), mode = %self.mode))]
    pub async fn process_batch(
        &self,
        items: Vec<Value>,
        dispatcher: &Dispatcher,
    ) -> Result<Vec<JsonRpcResponse>> {
        if let Some(max_size) = self.max_size {
            if items.len() > max_size {
                tracing::warn!(
                    batch_size = items.len(),
                    max_size = max_size,
                    "Batch size exceeded"
                );
                return Err(Error::BatchSizeExceeded {
                    limit: max_size,
                    actual: items.len(),
                });
            }
        }

        if let Some(metrics) = dispatcher.metrics() {
            metrics.record_batch(items.len() as u64, &self.mode.to_string());
        }

        let calls = validate::validate_batch(items);
        let responses = match self.mode {
            BatchMode::Sequential => process_sequential(calls, dispatcher).await,
            BatchMode::Parallel => process_parallel(calls, dispatcher).await,
        };

        tracing::debug!(response_count = responses.len(), "Batch processing completed");
        Ok(responses)
    }
}

async fn process_sequential(
    calls: Vec<std::result::Result<Call, InvalidCall>>,
    dispatcher: &Dispatcher,
) -> Vec<JsonRpcResponse> {
    let mut responses = Vec::with_capacity(calls.len());
    for call in calls {
        if let Some(response) = dispatcher.dispatch(call).await {
            responses.push(response);
        }
    }
    responses
}

async fn process_parallel(
    calls: Vec<std::result::Result<Call, InvalidCall>>,
    dispatcher: &Dispatcher,
) -> Vec<JsonRpcResponse> {
    let mut tasks = Vec::with_capacity(calls.len());
    for call in calls {
        // Kept so a task that dies can still be answered under its id.
        let id = match &call {
            Ok(call) => call.id().cloned(),
            Err(invalid) => Some(invalid.id.clone()),
        };
        let dispatcher = dispatcher.clone();
        tasks.push((
            id,
            tokio::spawn(async move { dispatcher.dispatch(call).await }),
        ));
    }

    let mut responses = Vec::with_capacity(tasks.len());
    for (id, task) in tasks {
        match task.await {
            Ok(Some(response)) => responses.push(response),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Batch item task failed");
                if let Some(id) = id {
                    responses.push(JsonRpcResponse::error(
                        JsonRpcErrorData::internal_error(e.to_string()),
                        id,
                    ));
                }
            }
        }
    }
    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use crate::router::RouterBuilder;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use zrpc_core::Id;

    fn counting_dispatcher() -> Dispatcher {
        let counter = Arc::new(AtomicU64::new(0));
        let router = RouterBuilder::new()
            .handler(
                "counter",
                from_fn(move |_| {
                    let counter = Arc::clone(&counter);
                    async move { Ok(json!(counter.fetch_add(1, Ordering::SeqCst) + 1)) }
                }),
            )
            .handler(
                "sleep",
                from_fn(|params| async move {
                    let ms = params
                        .into_value()
                        .and_then(|v| v.get(0).and_then(Value::as_u64))
                        .unwrap_or(0);
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(json!(ms))
                }),
            )
            .build();
        Dispatcher::new(router)
    }

    fn request(method: &str, params: Value, id: u64) -> Value {
        json!({"jsonrpc": "2.0", "method": method, "params": params, "id": id})
    }

    #[tokio::test]
    async fn test_sequential_total_order() {
        let processor = BatchProcessor::default();
        assert_eq!(processor.mode(), BatchMode::Sequential);

        let items = (0..10).map(|i| request("counter", json!([]), i)).collect();
        let responses = processor.process_batch(items, &counting_dispatcher()).await.unwrap();

        let values: Vec<u64> = responses
            .iter()
            .map(|r| r.result.as_ref().unwrap().as_u64().unwrap())
            .collect();
        assert_eq!(values, (1..=10).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_parallel_keeps_input_order() {
        let processor = BatchProcessor::new(BatchMode::Parallel);
        let items = vec![
            request("sleep", json!([60]), 1),
            request("sleep", json!([0]), 2),
            request("sleep", json!([30]), 3),
        ];
        let responses = processor.process_batch(items, &counting_dispatcher()).await.unwrap();

        let ids: Vec<Id> = responses.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![Id::from(1u64), Id::from(2u64), Id::from(3u64)]);
    }

    #[tokio::test]
    async fn test_notifications_are_omitted() {
        for mode in [BatchMode::Sequential, BatchMode::Parallel] {
            let processor = BatchProcessor::new(mode);
            let items = vec![
                json!({"jsonrpc": "2.0", "method": "counter"}),
                request("counter", json!([]), 7),
                json!({"jsonrpc": "2.0", "method": "nope"}),
            ];
            let responses = processor.process_batch(items, &counting_dispatcher()).await.unwrap();
            assert_eq!(responses.len(), 1);
            assert_eq!(responses[0].id, Id::from(7u64));
        }
    }

    #[tokio::test]
    async fn test_all_notifications_yield_nothing() {
        let processor = BatchProcessor::default();
        let items = vec![
            json!({"jsonrpc": "2.0", "method": "counter"}),
            json!({"jsonrpc": "2.0", "method": "counter"}),
        ];
        assert!(processor
            .process_batch(items, &counting_dispatcher())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invalid_items_answered_in_place() {
        let processor = BatchProcessor::default();
        let items = vec![json!(1), request("counter", json!([]), 2), json!([1])];
        let responses = processor.process_batch(items, &counting_dispatcher()).await.unwrap();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].error_code(), Some(-32600));
        assert!(responses[1].is_success());
        assert_eq!(responses[2].error_code(), Some(-32600));
    }

    #[tokio::test]
    async fn test_batch_size_limit() {
        let processor = BatchProcessor::with_limit(BatchMode::Sequential, Some(2));
        let dispatcher = counting_dispatcher();

        let items = (0..2).map(|i| request("counter", json!([]), i)).collect();
        assert_eq!(processor.process_batch(items, &dispatcher).await.unwrap().len(), 2);

        let items = (0..3).map(|i| request("counter", json!([]), i)).collect();
        let error = processor.process_batch(items, &dispatcher).await.unwrap_err();
        assert!(matches!(error, Error::BatchSizeExceeded { limit: 2, actual: 3 }));

        // None of the rejected items ran.
        let items = vec![request("counter", json!([]), 9)];
        let responses = processor.process_batch(items, &dispatcher).await.unwrap();
        assert_eq!(responses[0].result, Some(json!(3)));
    }

    #[test]
    fn test_batch_mode_parse() {
        assert_eq!("parallel".parse::<BatchMode>().unwrap(), BatchMode::Parallel);
        assert_eq!(" Sequential ".parse::<BatchMode>().unwrap(), BatchMode::Sequential);
        assert!(matches!("fast".parse::<BatchMode>(), Err(Error::Config(_))));
    }
}
