//! Reply-side transport
//!
//! The server talks to its transport through [`ReplyTransport`]: receive one
//! message, send exactly one message back, repeat. That strict alternation is
//! what a ZeroMQ REP socket enforces, and the engine's one-message-in,
//! at-most-one-reply-out contract maps onto it directly.
//!
//! A REP socket cannot skip a reply, so "no reply" (a notification, or a
//! batch of them) is sent as a zero-length frame. Clients treat an empty
//! frame as the absence of a reply message.

use async_trait::async_trait;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};
use zrpc_core::{Error, Result};

/// A strictly alternating receive/send message channel
#[async_trait]
pub trait ReplyTransport: Send {
    /// Wait for the next inbound message
    async fn recv(&mut self) -> Result<Vec<u8>>;

    /// Answer the last received message; an empty payload means "no reply"
    async fn send(&mut self, payload: Vec<u8>) -> Result<()>;
}

/// ZeroMQ REP socket bound to an endpoint
pub struct ZmqReplyTransport {
    socket: RepSocket,
    endpoint: String,
}

impl ZmqReplyTransport {
    /// Bind a REP socket, e.g. to `tcp://127.0.0.1:10000`
    ///
    /// Port `0` picks a free port; [`local_endpoint`](Self::local_endpoint)
    /// reports the one actually bound.
    pub async fn bind(endpoint: &str) -> Result<Self> {
        let mut socket = RepSocket::new();
        let bound = socket
            .bind(endpoint)
            .await
            .map_err(|e| Error::Transport(format!("failed to bind {}: {}", endpoint, e)))?;

        Ok(Self {
            socket,
            endpoint: bound.to_string(),
        })
    }

    /// The endpoint the socket is bound to, with the resolved port
    pub fn local_endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyTransport for ZmqReplyTransport {
    async fn recv(&mut self) -> Result<Vec<u8>> {
        let message = self
            .socket
            .recv()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        // Multipart messages are treated as one payload.
        Ok(message
            .into_vec()
            .into_iter()
            .flat_map(|frame| frame.to_vec())
            .collect())
    }

    async fn send(&mut self, payload: Vec<u8>) -> Result<()> {
        self.socket
            .send(ZmqMessage::from(payload))
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}
