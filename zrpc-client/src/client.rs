//! JSON-RPC client over a ZeroMQ REQ socket
//!
//! `ZrpcClient` owns one REQ socket. A REQ socket alternates strictly
//! between send and receive, so every operation holds the socket for a full
//! round trip; concurrent callers on clones of the same client queue up
//! behind each other.
//!
//! # Ids
//!
//! Request ids are numbers drawn from a counter owned by the client,
//! starting at 1 and shared by all clones and by batches created with
//! [`ZrpcClient::new_batch`].
//!
//! # Replies
//!
//! The server answers every message. An empty frame means the message
//! produced no response (a notification, or a batch of them).

use crate::batch::{BatchRequest, BatchResponse};
use crate::metrics::ClientMetrics;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};
use zrpc_core::{
    codec, Error, Id, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Params, Reply, Result,
};

/// JSON-RPC client over ZeroMQ
#[derive(Clone)]
pub struct ZrpcClient {
    socket: Arc<Mutex<ReqSocket>>,
    endpoint: String,
    next_id: Arc<AtomicU64>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl ZrpcClient {
    /// Connect a REQ socket to `endpoint`, e.g. `tcp://127.0.0.1:10000`
    #[tracing::instrument(fields(endpoint = endpoint))]
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let mut socket = ReqSocket::new();
        socket
            .connect(endpoint)
            .await
            .map_err(|e| Error::Transport(format!("failed to connect {}: {}", endpoint, e)))?;

        tracing::info!("Connected");
        Ok(Self {
            socket: Arc::new(Mutex::new(socket)),
            endpoint: endpoint.to_string(),
            next_id: Arc::new(AtomicU64::new(1)),
            metrics: None,
        })
    }

    /// Record OpenTelemetry metrics under `service_name`
    pub fn with_metrics(mut self, service_name: impl Into<String>) -> Self {
        self.metrics = Some(Arc::new(ClientMetrics::new(service_name)));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_id(&self) -> Id {
        Id::from(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Start a batch that draws ids from this client's counter
    pub fn new_batch(&self) -> BatchRequest {
        BatchRequest::with_counter(Arc::clone(&self.next_id))
    }

    /// One full round trip on the socket
    async fn exchange(&self, payload: Vec<u8>) -> Result<Vec<u8>> {
        let mut socket = self.socket.lock().await;
        socket
            .send(ZmqMessage::from(payload))
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let reply = socket
            .recv()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(reply
            .into_vec()
            .into_iter()
            .flat_map(|frame| frame.to_vec())
            .collect())
    }

    /// Send a request and return the raw response object
    #[tracing::instrument(skip(self, params), fields(method = %method.as_ref()))]
    pub async fn call<P>(&self, method: impl Into<String> + AsRef<str>, params: P) -> Result<JsonRpcResponse>
    where
        P: Serialize,
    {
        let start = Instant::now();
        let method_name = method.as_ref().to_string();
        let request = JsonRpcRequest::new(method, Params::from_serializable(params)?, self.next_id());

        let outcome = self.round_trip(&request).await;

        if let Some(ref m) = self.metrics {
            let status = match &outcome {
                Ok(response) if response.is_success() => "success",
                _ => "error",
            };
            m.record_request(&method_name, status, start.elapsed().as_secs_f64());
            if outcome.is_err() {
                m.record_error("transport");
            }
        }
        outcome
    }

    async fn round_trip(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        let bytes = self.exchange(codec::encode_request(request)?).await?;
        match codec::decode_reply(&bytes)? {
            Some(Reply::Single(response)) => {
                if response.id != request.id && !response.id.is_null() {
                    tracing::warn!(sent = %request.id, received = %response.id, "Response id mismatch");
                }
                Ok(response)
            }
            Some(Reply::Batch(_)) => Err(Error::Internal(
                "received a batch reply to a single request".to_string(),
            )),
            None => Err(Error::Internal(
                "received no reply to a request".to_string(),
            )),
        }
    }

    /// Send a request and deserialize its result
    ///
    /// An error response becomes `Error::JsonRpc` with the server's error
    /// object.
    pub async fn request<P, R>(&self, method: impl Into<String> + AsRef<str>, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let value = self.call(method, params).await?.into_result()?;
        serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Send a notification
    ///
    /// The server answers with an empty frame. Anything else is unexpected
    /// and reported: an error object (an Invalid Request for a malformed
    /// notification) as `Error::JsonRpc`, other content as `Error::Internal`.
    #[tracing::instrument(skip(self, params), fields(method = %method.as_ref()))]
    pub async fn notify<P>(&self, method: impl Into<String> + AsRef<str>, params: P) -> Result<()>
    where
        P: Serialize,
    {
        let notification = JsonRpcNotification::new(method, Params::from_serializable(params)?);
        let bytes = self.exchange(codec::encode_notification(&notification)?).await?;

        match codec::decode_reply(&bytes)? {
            None => Ok(()),
            Some(Reply::Single(response)) => match response.error {
                Some(error) => Err(Error::JsonRpc(error)),
                None => Err(Error::Internal(
                    "received a response to a notification".to_string(),
                )),
            },
            Some(Reply::Batch(_)) => Err(Error::Internal(
                "received a batch reply to a notification".to_string(),
            )),
        }
    }

    /// Send a batch
    ///
    /// Returns `None` when the server produced no responses (every item was a
    /// notification). A batch rejected as a whole, for example for exceeding
    /// the server's size limit, is reported as `Error::JsonRpc`.
    #[tracing::instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn batch(&self, batch: BatchRequest) -> Result<Option<BatchResponse>> {
        if batch.is_empty() {
            return Err(Error::InvalidRequest("Batch cannot be empty".to_string()));
        }
        if let Some(ref m) = self.metrics {
            m.record_batch(batch.len() as u64);
        }

        let bytes = self.exchange(codec::encode(&batch.into_value())?).await?;
        match codec::decode_reply(&bytes)? {
            None => Ok(None),
            Some(Reply::Batch(responses)) => {
                tracing::debug!(response_count = responses.len(), "Batch completed");
                Ok(Some(BatchResponse::new(responses)))
            }
            Some(Reply::Single(response)) => Err(match response.error {
                Some(error) => Error::JsonRpc(error),
                None => Error::Internal("received a single response to a batch".to_string()),
            }),
        }
    }

    /// Send raw bytes and return the decoded reply
    ///
    /// Nothing is checked on the way out, so this can send malformed JSON.
    /// Returns `None` for an empty reply frame.
    pub async fn call_raw(&self, payload: impl Into<Vec<u8>>) -> Result<Option<Value>> {
        let bytes = self.exchange(payload.into()).await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}
