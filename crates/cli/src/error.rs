// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors surfaced by the outbox CLI.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no remote configured\n  hint: run 'outbox init --remote ws://host:port' first")]
    NoRemote,

    #[error("invalid payload: {0}\n  hint: payloads must be a single JSON value, e.g. '{{\"note\": \"hi\"}}'")]
    InvalidPayload(String),

    #[error("pending entry not found: {0}\n  hint: run 'outbox list' to see queued ids")]
    EntryNotFound(String),

    #[error("storage unavailable: {0}\n  hint: the queue file could not be read or written; check permissions on the state directory")]
    StorageUnavailable(String),

    #[error("corrupted queue data: {0}")]
    CorruptedData(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("submission failed: {0}")]
    SubmitFailed(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<ob_core::Error> for Error {
    fn from(e: ob_core::Error) -> Self {
        match e {
            ob_core::Error::StorageUnavailable(s) => Error::StorageUnavailable(s),
            ob_core::Error::EntryNotFound(id) => Error::EntryNotFound(id),
            ob_core::Error::CorruptedData(s) => Error::CorruptedData(s),
            ob_core::Error::InvalidInput(s) => Error::InvalidInput(s),
            ob_core::Error::Io(e) => Error::Io(e),
            ob_core::Error::Json(e) => Error::Json(e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
