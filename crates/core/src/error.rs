// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ob-core operations.

use thiserror::Error;

/// All possible errors that can occur in ob-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}\n  hint: the entry could not be saved for later; submit it again once storage is writable")]
    StorageUnavailable(String),

    #[error("pending entry not found: {0}")]
    EntryNotFound(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps an I/O failure on the backing store as [`Error::StorageUnavailable`].
    pub(crate) fn unavailable(path: &std::path::Path, err: std::io::Error) -> Self {
        Error::StorageUnavailable(format!("{}: {}", path.display(), err))
    }
}

/// A specialized Result type for ob-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
