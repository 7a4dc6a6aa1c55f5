//! Batch request building and response handling
//!
//! A batch is sent as one JSON array in one ZeroMQ message. The server runs
//! the items and answers with the responses of the requests, in the order
//! the requests were added; notifications have no entry. When a batch holds
//! only notifications the server answers with an empty frame, which the
//! client reports as `None`.
//!
//! # Usage Pattern
//!
//! 1. Create a `BatchRequest`, usually with `ZrpcClient::new_batch` so ids
//!    come from the client's counter
//! 2. Add requests, notifications or raw items
//! 3. Send it with `ZrpcClient::batch`
//! 4. Read results in order, or by id through `BatchResponse`
//!
//! # Examples
//!
//! ```rust,no_run
//! use zrpc_client::ZrpcClient;
//! use serde_json::json;
//!
//! # async fn example(client: &ZrpcClient) -> zrpc_core::Result<()> {
//! let mut batch = client.new_batch();
//! let sum = batch.add_request("sum", json!([1, 2, 4]))?;
//! batch.add_notification("notify_hello", json!([7]))?;
//! let diff = batch.add_request("subtract", json!([42, 23]))?;
//!
//! if let Some(responses) = client.batch(batch).await? {
//!     let total: i64 = responses.get(&sum)?;
//!     let difference: i64 = responses.get(&diff)?;
//!     assert_eq!((total, difference), (7, 19));
//! }
//! # Ok(())
//! # }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use zrpc_core::{
    Error, Id, JsonRpcErrorData, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Params,
    Result,
};

/// Ordered builder for a batch message
#[derive(Debug)]
pub struct BatchRequest {
    items: Vec<Value>,
    request_ids: Vec<Id>,
    counter: Arc<AtomicU64>,
}

impl BatchRequest {
    /// Batch with its own id counter starting at 1
    pub fn new() -> Self {
        Self::with_counter(Arc::new(AtomicU64::new(1)))
    }

    /// Batch drawing ids from a shared counter
    pub fn with_counter(counter: Arc<AtomicU64>) -> Self {
        Self {
            items: Vec::new(),
            request_ids: Vec::new(),
            counter,
        }
    }

    /// Add a request and return the id it was given
    pub fn add_request<P>(&mut self, method: impl Into<String>, params: P) -> Result<Id>
    where
        P: Serialize,
    {
        let id = Id::from(self.counter.fetch_add(1, Ordering::SeqCst));
        let request = JsonRpcRequest::new(method, Params::from_serializable(params)?, id.clone());
        self.items.push(serde_json::to_value(request)?);
        self.request_ids.push(id.clone());
        Ok(id)
    }

    pub fn add_notification<P>(&mut self, method: impl Into<String>, params: P) -> Result<()>
    where
        P: Serialize,
    {
        let notification = JsonRpcNotification::new(method, Params::from_serializable(params)?);
        self.items.push(serde_json::to_value(notification)?);
        Ok(())
    }

    /// Add an arbitrary JSON value as an item, valid or not
    pub fn add_raw(&mut self, item: Value) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids of the requests added so far, in insertion order
    pub fn request_ids(&self) -> &[Id] {
        &self.request_ids
    }

    pub(crate) fn into_value(self) -> Value {
        Value::Array(self.items)
    }
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Responses to a batch, in the order the server sent them
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    responses: Vec<JsonRpcResponse>,
}

impl BatchResponse {
    pub fn new(responses: Vec<JsonRpcResponse>) -> Self {
        Self { responses }
    }

    /// Typed result of the request with the given id
    pub fn get<R>(&self, id: &Id) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self
            .get_response(id)
            .ok_or_else(|| Error::Internal(format!("No response for ID: {}", id)))?;

        let value = response.clone().into_result()?;
        serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// First response carrying `id`
    pub fn get_response(&self, id: &Id) -> Option<&JsonRpcResponse> {
        self.responses.iter().find(|r| &r.id == id)
    }

    pub fn has_response(&self, id: &Id) -> bool {
        self.get_response(id).is_some()
    }

    pub fn responses(&self) -> &[JsonRpcResponse] {
        &self.responses
    }

    pub fn into_responses(self) -> Vec<JsonRpcResponse> {
        self.responses
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn all_success(&self) -> bool {
        self.responses.iter().all(JsonRpcResponse::is_success)
    }

    /// Error responses, in order
    pub fn errors(&self) -> Vec<(&Id, &JsonRpcErrorData)> {
        self.responses
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| (&r.id, e)))
            .collect()
    }
}
