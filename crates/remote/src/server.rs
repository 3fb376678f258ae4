// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! One task per connection. Every `submit` is answered with `accepted` or
//! `rejected` carrying the client's request id; `ping` is answered with
//! `pong`. Unparseable frames get an `error` and the connection stays open.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use ob_core::protocol::{ClientMessage, ServerMessage};

use crate::state::IntakeState;

/// Run the WebSocket server on an already bound listener.
pub async fn serve(listener: TcpListener, state: IntakeState) -> std::io::Result<()> {
    info!("Listening on: {}", listener.local_addr()?);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                debug!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Bind `addr` and run the server.
pub async fn run(addr: SocketAddr, state: IntakeState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: IntakeState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = handle_client_message(&text, &state).await;
                let json = response.to_json()?;
                ws_sink.send(Message::Text(json.into())).await?;
            }
            Ok(Message::Close(_)) => {
                info!("Client {} disconnected", peer_addr);
                break;
            }
            Ok(Message::Ping(data)) => {
                ws_sink.send(Message::Pong(data)).await?;
            }
            Ok(_) => {
                // Ignore other message types (Binary, Pong, Frame)
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Process a client message and return the response.
pub(crate) async fn handle_client_message(text: &str, state: &IntakeState) -> ServerMessage {
    let msg = match ClientMessage::from_json(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Unparseable message: {}", e);
            return ServerMessage::error(format!("invalid message: {}", e));
        }
    };

    match msg {
        ClientMessage::Submit {
            request_id,
            payload,
        } => match state.accept(payload).await {
            Ok(record) => {
                info!(request_id, record = %record.id, "accepted");
                ServerMessage::accepted(request_id, record)
            }
            Err(e) => {
                info!(request_id, reason = %e, "rejected");
                ServerMessage::rejected(request_id, e.to_string())
            }
        },

        ClientMessage::Ping { id } => {
            debug!("Ping received: {}", id);
            ServerMessage::pong(id)
        }
    }
}
