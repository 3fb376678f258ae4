// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Intake state management.
//!
//! Wraps the durable record log for shared access across connections.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use ob_core::protocol::ServerRecord;
use ob_core::{jsonl, Result};

const RECORDS_FILE_NAME: &str = "records.jsonl";
const RECORD_ID_PREFIX: &str = "rec-";

/// Why a payload was not stored.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("storage error: {0}")]
    Storage(#[from] ob_core::Error),
}

/// Shared intake state: the record log and payload requirements.
#[derive(Clone)]
pub struct IntakeState {
    inner: Arc<IntakeStateInner>,
}

struct IntakeStateInner {
    records_path: PathBuf,
    /// Next record sequence number (protected by mutex so ids stay dense).
    next_seq: Mutex<u64>,
    /// Top-level keys every payload must carry.
    required: Vec<String>,
}

impl IntakeState {
    /// Opens the record log in the given directory, resuming its sequence.
    pub fn open(data_dir: &Path, required: Vec<String>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let records_path = data_dir.join(RECORDS_FILE_NAME);

        let records: Vec<ServerRecord> = jsonl::read_all(&records_path)?;
        let last_seq = records
            .iter()
            .filter_map(|r| r.id.strip_prefix(RECORD_ID_PREFIX)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        Ok(IntakeState {
            inner: Arc::new(IntakeStateInner {
                records_path,
                next_seq: Mutex::new(last_seq + 1),
                required,
            }),
        })
    }

    /// Checks a payload against the intake rules.
    pub fn validate(&self, payload: &Value) -> std::result::Result<(), IntakeError> {
        let object = payload.as_object().ok_or(IntakeError::NotAnObject)?;
        match self.inner.required.iter().find(|f| !object.contains_key(*f)) {
            Some(field) => Err(IntakeError::MissingField(field.clone())),
            None => Ok(()),
        }
    }

    /// Validates and durably stores a payload, returning its record.
    pub async fn accept(&self, payload: Value) -> std::result::Result<ServerRecord, IntakeError> {
        self.validate(&payload)?;

        let mut next_seq = self.inner.next_seq.lock().await;
        let record = ServerRecord {
            id: format!("{}{}", RECORD_ID_PREFIX, *next_seq),
            received_at: Utc::now(),
            payload,
        };
        jsonl::append(&self.inner.records_path, &record)?;
        *next_seq += 1;
        Ok(record)
    }

    /// All stored records, in arrival order.
    pub async fn records(&self) -> Result<Vec<ServerRecord>> {
        // Hold the sequence lock so a concurrent append is never half-read.
        let _guard = self.inner.next_seq.lock().await;
        jsonl::read_all(&self.inner.records_path)
    }

    pub fn records_path(&self) -> &Path {
        &self.inner.records_path
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
