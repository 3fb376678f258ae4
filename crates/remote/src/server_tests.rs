// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test server utilities and server tests.
//!
//! Provides a TestServer that runs on a random port for exercising the
//! connection handler end to end.

#![cfg(test)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::server;
use crate::state::IntakeState;

/// A test server that runs on a random port and can be controlled.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    state: IntakeState,
    /// Keep the temp directory alive for the lifetime of the test server.
    _temp_dir: tempfile::TempDir,
}

impl TestServer {
    /// Start a new test server on a random available port.
    pub async fn start(required: Vec<String>) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = IntakeState::open(temp_dir.path(), required).unwrap();

        // Bind to port 0 to get a random available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let state_clone = state.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = server::serve(listener, state_clone) => {
                    if let Err(e) = result {
                        eprintln!("Test server error: {}", e);
                    }
                }
                _ = shutdown_rx => {}
            }
        });

        TestServer {
            addr,
            shutdown_tx,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get the WebSocket URL for connecting to this server.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Get access to the server state for verification.
    pub fn state(&self) -> &IntakeState {
        &self.state
    }

    /// Shutdown the test server.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use ob_core::protocol::{ClientMessage, ServerMessage};
    use serde_json::json;
    use std::time::Duration;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect(server: &TestServer) -> Ws {
        let (ws, _) = connect_async(server.ws_url()).await.unwrap();
        ws
    }

    async fn send_text(ws: &mut Ws, text: String) {
        ws.send(Message::Text(text.into())).await.unwrap();
    }

    async fn recv(ws: &mut Ws) -> ServerMessage {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for server")
            .unwrap()
            .unwrap();
        match msg {
            Message::Text(text) => ServerMessage::from_json(&text).unwrap(),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    async fn submit(ws: &mut Ws, request_id: u64, payload: serde_json::Value) -> ServerMessage {
        let msg = ClientMessage::submit(request_id, payload).to_json().unwrap();
        send_text(ws, msg).await;
        recv(ws).await
    }

    #[tokio::test]
    async fn test_submit_is_accepted_and_stored() {
        let server = TestServer::start(vec![]).await;
        let mut ws = connect(&server).await;

        match submit(&mut ws, 7, json!({"note": "hi"})).await {
            ServerMessage::Accepted { request_id, record } => {
                assert_eq!(request_id, 7);
                assert_eq!(record.id, "rec-1");
                assert_eq!(record.payload, json!({"note": "hi"}));
            }
            other => panic!("expected accepted, got {:?}", other),
        }

        let stored = server.state().records().await.unwrap();
        assert_eq!(stored.len(), 1);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected() {
        let server = TestServer::start(vec!["kind".to_string()]).await;
        let mut ws = connect(&server).await;

        match submit(&mut ws, 1, json!({"note": "hi"})).await {
            ServerMessage::Rejected {
                request_id,
                message,
            } => {
                assert_eq!(request_id, 1);
                assert!(message.contains("kind"));
            }
            other => panic!("expected rejected, got {:?}", other),
        }
        match submit(&mut ws, 2, json!("scalar")).await {
            ServerMessage::Rejected { request_id, .. } => assert_eq!(request_id, 2),
            other => panic!("expected rejected, got {:?}", other),
        }

        assert!(server.state().records().await.unwrap().is_empty());
        server.shutdown();
    }

    #[tokio::test]
    async fn test_answers_keep_request_order_on_one_connection() {
        let server = TestServer::start(vec![]).await;
        let mut ws = connect(&server).await;

        for id in 1..=3 {
            let answer = submit(&mut ws, id, json!({"n": id})).await;
            assert_eq!(answer.request_id(), Some(id));
        }
        server.shutdown();
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let server = TestServer::start(vec![]).await;
        let mut ws = connect(&server).await;

        send_text(&mut ws, ClientMessage::ping(42).to_json().unwrap()).await;
        assert_eq!(recv(&mut ws).await, ServerMessage::pong(42));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_garbage_gets_error_and_connection_survives() {
        let server = TestServer::start(vec![]).await;
        let mut ws = connect(&server).await;

        send_text(&mut ws, "{not json".to_string()).await;
        match recv(&mut ws).await {
            ServerMessage::Error { message } => assert!(message.starts_with("invalid message")),
            other => panic!("expected error, got {:?}", other),
        }

        let answer = submit(&mut ws, 5, json!({})).await;
        assert!(matches!(answer, ServerMessage::Accepted { .. }));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_handle_client_message_directly() {
        let temp = tempfile::tempdir().unwrap();
        let state = IntakeState::open(temp.path(), vec![]).unwrap();

        let reply = server::handle_client_message(r#"{"type":"ping","id":3}"#, &state).await;
        assert_eq!(reply, ServerMessage::pong(3));

        let reply = server::handle_client_message(r#"{"type":"nope"}"#, &state).await;
        assert!(matches!(reply, ServerMessage::Error { .. }));
    }
}
