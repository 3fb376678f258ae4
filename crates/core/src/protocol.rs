// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between the sync engine and the intake server.
//!
//! The protocol is request/response:
//! - Client submits a payload tagged with a request id
//! - Server answers with the stored record or a rejection for that id

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The authoritative record the server keeps for an accepted payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerRecord {
    /// Server-assigned identifier.
    pub id: String,
    /// When the server accepted the payload.
    pub received_at: DateTime<Utc>,
    /// The payload as stored.
    pub payload: Value,
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit a payload for storage.
    Submit {
        /// Client-chosen ID echoed in the answer.
        request_id: u64,
        payload: Value,
    },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The payload was stored.
    Accepted { request_id: u64, record: ServerRecord },

    /// The payload was refused.
    Rejected {
        request_id: u64,
        /// Human-readable reason.
        message: String,
    },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// A message that could not be tied to a request (e.g. unparseable JSON).
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Submit message.
    pub fn submit(request_id: u64, payload: Value) -> Self {
        ClientMessage::Submit {
            request_id,
            payload,
        }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Accepted message.
    pub fn accepted(request_id: u64, record: ServerRecord) -> Self {
        ServerMessage::Accepted { request_id, record }
    }

    /// Creates a Rejected message.
    pub fn rejected(request_id: u64, message: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            request_id,
            message: message.into(),
        }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Returns the request id this message answers, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerMessage::Accepted { request_id, .. }
            | ServerMessage::Rejected { request_id, .. } => Some(*request_id),
            ServerMessage::Pong { .. } | ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
