//! Shared fixtures for the server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use zrpc_core::{Error, Params, Result};
use zrpc_server::{from_fn, Engine, ParamsSpec, ReplyTransport, Router, RouterBuilder};

/// In-memory reply transport driven through a pair of channels
pub struct ChannelTransport {
    inbound: mpsc::Receiver<Vec<u8>>,
    outbound: mpsc::Sender<Vec<u8>>,
}

/// The test's side of a [`ChannelTransport`]
pub struct Peer {
    requests: mpsc::Sender<Vec<u8>>,
    replies: mpsc::Receiver<Vec<u8>>,
}

impl Peer {
    pub async fn send(&self, payload: impl Into<Vec<u8>>) {
        self.requests.send(payload.into()).await.unwrap();
    }

    pub async fn recv(&mut self) -> Vec<u8> {
        self.replies.recv().await.unwrap()
    }

    /// Close the request side, making the transport fail on its next receive
    pub fn hang_up(self) {}
}

pub fn channel_transport() -> (ChannelTransport, Peer) {
    let (requests, inbound) = mpsc::channel(16);
    let (outbound, replies) = mpsc::channel(16);
    (
        ChannelTransport { inbound, outbound },
        Peer { requests, replies },
    )
}

#[async_trait]
impl ReplyTransport for ChannelTransport {
    async fn recv(&mut self) -> Result<Vec<u8>> {
        self.inbound.recv().await.ok_or(Error::ConnectionClosed)
    }

    async fn send(&mut self, payload: Vec<u8>) -> Result<()> {
        self.outbound
            .send(payload)
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}

/// A few methods covering success, failure and panics
pub fn test_router() -> Router {
    RouterBuilder::new()
        .handler_with_spec(
            "subtract",
            ParamsSpec::Arity(2),
            from_fn(|params: Params| async move {
                let (a, b): (i64, i64) = params.parse()?;
                Ok(json!(a - b))
            }),
        )
        .handler(
            "echo",
            from_fn(|params: Params| async move { Ok(params.into_value().unwrap_or(Value::Null)) }),
        )
        .handler(
            "fail",
            from_fn(|_| async { Err::<Value, _>(Error::Internal("boom".to_string())) }),
        )
        .handler(
            "panic",
            from_fn(|params: Params| async move {
                if params.is_none() {
                    panic!("no params");
                }
                Ok(Value::Null)
            }),
        )
        .build()
}

pub fn test_engine() -> Engine {
    Engine::new(test_router())
}

/// Decode a reply payload, `None` for the empty "no reply" frame
pub fn parse(payload: &[u8]) -> Option<Value> {
    if payload.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(payload).unwrap())
    }
}
