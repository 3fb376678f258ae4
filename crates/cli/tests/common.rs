// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::{Arc, Mutex};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use futures_util::{SinkExt, StreamExt};
use ob_core::protocol::{ClientMessage, ServerMessage, ServerRecord};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `outbox` pointed at `temp`, isolated from the caller's environment.
pub fn outbox(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("outbox");
    cmd.arg("--dir")
        .arg(temp.path())
        .env_remove("OUTBOX_DIR")
        .env_remove("OUTBOX_LOG");
    cmd
}

/// Enqueue a payload and return the printed id.
pub fn enqueue(temp: &TempDir, payload: &str) -> String {
    let output = outbox(temp).arg("enqueue").arg(payload).output().unwrap();
    assert!(output.status.success(), "enqueue failed: {:?}", output);
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Pending entries as parsed from `list -o json`.
pub fn list_json(temp: &TempDir) -> Vec<Value> {
    let output = outbox(temp)
        .args(["list", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

/// A localhost port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// In-process intake server speaking the submit protocol.
///
/// Payloads for which `reject` returns true are answered with `rejected`.
pub struct IntakeServer {
    pub url: String,
    accepted: Arc<Mutex<Vec<Value>>>,
}

impl IntakeServer {
    pub fn start(reject: fn(&Value) -> bool) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let accepted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&accepted);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                let mut seq = 0u64;
                while let Ok((stream, _)) = listener.accept().await {
                    // Probes connect and hang up without a handshake.
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        continue;
                    };
                    while let Some(Ok(Message::Text(text))) = ws.next().await {
                        let reply = match ClientMessage::from_json(&text) {
                            Ok(ClientMessage::Submit {
                                request_id,
                                payload,
                            }) if reject(&payload) => {
                                ServerMessage::rejected(request_id, "refused by test server")
                            }
                            Ok(ClientMessage::Submit {
                                request_id,
                                payload,
                            }) => {
                                seq += 1;
                                sink.lock().unwrap().push(payload.clone());
                                ServerMessage::accepted(
                                    request_id,
                                    ServerRecord {
                                        id: format!("rec-{seq}"),
                                        received_at: chrono::Utc::now(),
                                        payload,
                                    },
                                )
                            }
                            Ok(ClientMessage::Ping { id }) => ServerMessage::pong(id),
                            Err(e) => ServerMessage::error(e.to_string()),
                        };
                        let json = reply.to_json().unwrap();
                        if ws.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            });
        });

        IntakeServer { url, accepted }
    }

    /// Payloads accepted so far, in arrival order.
    pub fn accepted(&self) -> Vec<Value> {
        self.accepted.lock().unwrap().clone()
    }
}
