// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote submission capability.
//!
//! Provides a trait-based submission layer that enables:
//! - Real WebSocket submissions to an ob-remote server
//! - Mock submitters for unit testing
//!
//! A submitter owns its own timeout: every call resolves, one way or the
//! other, without the coordinator imposing a deadline.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ob_core::protocol::{ClientMessage, ServerMessage, ServerRecord};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

/// Error type for submission attempts.
///
/// The coordinator records only the `Display` text; all variants count as
/// transient at the per-attempt level.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed before an answer arrived.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The server refused the payload.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// No answer within the submit timeout.
    #[error("no answer within {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Result type for submissions.
pub type SubmitResult<T> = Result<T, SubmitError>;

/// Future returned by [`Submitter::submit`].
pub type SubmitFuture<'a> = Pin<Box<dyn Future<Output = SubmitResult<ServerRecord>> + Send + 'a>>;

/// Sends one payload to the remote endpoint.
///
/// Resolves with the server's authoritative record on success, or an error
/// carrying a human-readable message.
pub trait Submitter: Send + Sync {
    fn submit(&self, payload: Value) -> SubmitFuture<'_>;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: futures_util::stream::SplitSink<WsStream, Message>,
    stream: futures_util::stream::SplitStream<WsStream>,
}

/// Submitter speaking the ob-remote protocol over a WebSocket.
///
/// Connects on first use and keeps the connection for later submits. A
/// broken or timed-out exchange drops the connection so the next submit
/// reconnects.
pub struct WebSocketSubmitter {
    url: String,
    timeout: Duration,
    ws: Mutex<Option<WebSocketConnection>>,
    next_request_id: AtomicU64,
}

impl WebSocketSubmitter {
    /// Create a submitter for the given `ws://` or `wss://` URL.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        WebSocketSubmitter {
            url: url.into(),
            timeout,
            ws: Mutex::new(None),
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Returns true if a connection is currently held open.
    pub async fn is_connected(&self) -> bool {
        self.ws.lock().await.is_some()
    }

    async fn exchange(
        &self,
        slot: &mut Option<WebSocketConnection>,
        request_id: u64,
        payload: Value,
    ) -> SubmitResult<ServerRecord> {
        if slot.is_none() {
            let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
                .await
                .map_err(|e| SubmitError::ConnectionFailed(e.to_string()))?;
            let (sink, stream) = ws_stream.split();
            *slot = Some(WebSocketConnection { sink, stream });
            tracing::debug!(url = %self.url, "connected to intake server");
        }
        let ws = slot.as_mut().ok_or(SubmitError::ConnectionClosed)?;

        let json = ClientMessage::submit(request_id, payload)
            .to_json()
            .map_err(|e| SubmitError::Serialization(e.to_string()))?;
        ws.sink
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| SubmitError::SendFailed(e.to_string()))?;

        loop {
            match ws.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let msg = ServerMessage::from_json(&text)
                        .map_err(|e| SubmitError::Serialization(e.to_string()))?;
                    match msg {
                        ServerMessage::Accepted { request_id: id, record } if id == request_id => {
                            return Ok(record);
                        }
                        ServerMessage::Rejected { request_id: id, message } if id == request_id => {
                            return Err(SubmitError::Rejected(message));
                        }
                        ServerMessage::Error { message } => {
                            return Err(SubmitError::Rejected(message));
                        }
                        // Stale answers and pongs
                        _ => continue,
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Err(SubmitError::ConnectionClosed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SubmitError::ReceiveFailed(e.to_string())),
            }
        }
    }
}

impl Submitter for WebSocketSubmitter {
    fn submit(&self, payload: Value) -> SubmitFuture<'_> {
        Box::pin(async move {
            let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
            let mut slot = self.ws.lock().await;

            let result =
                match tokio::time::timeout(self.timeout, self.exchange(&mut slot, request_id, payload))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(SubmitError::Timeout(self.timeout)),
                };

            // A rejection is a clean answer; anything else leaves the stream
            // in an unknown state.
            if matches!(&result, Err(e) if !matches!(e, SubmitError::Rejected(_))) {
                *slot = None;
            }
            result
        })
    }
}
