// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending entries awaiting submission.
//!
//! A [`PendingEntry`] wraps an opaque JSON payload with the bookkeeping the
//! sync engine needs: when it was queued, how many submission attempts were
//! charged against it, and how the last one went.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attempts after which an entry is no longer retried automatically.
pub const MAX_RETRY_ATTEMPTS: u32 = 5;

/// A unit of work awaiting submission to the remote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEntry {
    /// Device-unique identifier assigned at enqueue time.
    pub id: String,
    /// Domain data to submit, opaque to the queue.
    pub payload: Value,
    /// When the entry was enqueued.
    pub created_at: DateTime<Utc>,
    /// Submission attempts charged so far.
    #[serde(default)]
    pub attempts: u32,
    /// When the most recent attempt started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Description of the most recent failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Whether an entry is still subject to automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// `attempts < max`: picked up by periodic and online-triggered passes.
    Eligible,
    /// Retry ceiling reached: waits for a manual retry or discard.
    NeedsAttention,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Eligible => "pending",
            EntryStatus::NeedsAttention => "needs-attention",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PendingEntry {
    /// Creates a fresh entry with no attempts charged.
    pub fn new(id: String, payload: Value, created_at: DateTime<Utc>) -> Self {
        PendingEntry {
            id,
            payload,
            created_at,
            attempts: 0,
            last_attempt_at: None,
            last_error: None,
        }
    }

    /// Returns true if automatic sync may still attempt this entry.
    pub fn is_eligible(&self, max_attempts: u32) -> bool {
        self.attempts < max_attempts
    }

    /// Classifies the entry against the retry ceiling.
    pub fn status(&self, max_attempts: u32) -> EntryStatus {
        if self.is_eligible(max_attempts) {
            EntryStatus::Eligible
        } else {
            EntryStatus::NeedsAttention
        }
    }

    /// Counts one more attempt, started at `at`.
    pub fn charge(&mut self, at: DateTime<Utc>) {
        self.attempts = self.attempts.saturating_add(1);
        self.last_attempt_at = Some(at);
    }

    /// Merges the set fields of `patch` into this entry.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(payload) = &patch.payload {
            self.payload = payload.clone();
        }
        if let Some(attempts) = patch.attempts {
            self.attempts = attempts;
        }
        if let Some(at) = patch.last_attempt_at {
            self.last_attempt_at = at;
        }
        if let Some(error) = &patch.last_error {
            self.last_error = error.clone();
        }
    }
}

/// A partial update to a [`PendingEntry`].
///
/// `None` leaves a field untouched. The nested options on the optional
/// fields distinguish "leave alone" (`None`) from "clear" (`Some(None)`).
/// `id` and `created_at` are fixed at enqueue time and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub payload: Option<Value>,
    pub attempts: Option<u32>,
    pub last_attempt_at: Option<Option<DateTime<Utc>>>,
    pub last_error: Option<Option<String>>,
}

impl EntryPatch {
    /// Records the failure message of the latest attempt.
    pub fn failure(message: impl Into<String>) -> Self {
        EntryPatch {
            last_error: Some(Some(message.into())),
            ..Default::default()
        }
    }

    /// Clears the attempt count and last error (manual retry).
    pub fn reset() -> Self {
        EntryPatch {
            attempts: Some(0),
            last_error: Some(None),
            ..Default::default()
        }
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &EntryPatch::default()
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
