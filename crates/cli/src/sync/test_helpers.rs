// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use ob_core::{PendingEntry, ServerRecord};
use serde_json::Value;
use tokio::sync::Notify;

use super::coordinator::SyncObserver;
use super::submitter::{SubmitError, SubmitFuture, Submitter};

type Predicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;
type Hook = Box<dyn Fn(&Value) + Send + Sync>;

/// Submitter that records payloads and fails the ones matching a predicate.
pub struct MockSubmitter {
    fail_when: Predicate,
    on_submit: Option<Hook>,
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
    calls: Mutex<Vec<Value>>,
    next_record: AtomicU64,
}

impl MockSubmitter {
    /// Accepts everything.
    pub fn accepting() -> Self {
        Self::failing_when(|_| false)
    }

    /// Rejects everything.
    pub fn failing() -> Self {
        Self::failing_when(|_| true)
    }

    /// Rejects payloads for which `predicate` returns true.
    pub fn failing_when<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        MockSubmitter {
            fail_when: Box::new(predicate),
            on_submit: None,
            gate: None,
            started: Arc::new(Notify::new()),
            calls: Mutex::new(Vec::new()),
            next_record: AtomicU64::new(1),
        }
    }

    /// Run `hook` at the start of every submission.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_submit = Some(Box::new(hook));
        self
    }

    /// Hold every submission until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Notified each time a submission starts.
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    /// Payloads submitted so far, in order.
    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

impl Submitter for MockSubmitter {
    fn submit(&self, payload: Value) -> SubmitFuture<'_> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(payload.clone());
            if let Some(hook) = &self.on_submit {
                hook(&payload);
            }
            self.started.notify_one();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            if (self.fail_when)(&payload) {
                return Err(SubmitError::Rejected("mock rejection".to_string()));
            }
            let seq = self.next_record.fetch_add(1, Ordering::SeqCst);
            Ok(ServerRecord {
                id: format!("rec-{seq}"),
                received_at: Utc::now(),
                payload,
            })
        })
    }
}

/// Observer that records every callback.
#[derive(Default)]
pub struct RecordingObserver {
    pub successes: Mutex<Vec<ServerRecord>>,
    pub errors: Mutex<Vec<(String, PendingEntry)>>,
    pub failures: Mutex<Vec<(String, PendingEntry)>>,
}

impl RecordingObserver {
    pub fn success_count(&self) -> usize {
        self.successes.lock().unwrap().len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().unwrap().len()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_sync_success(&self, record: &ServerRecord) {
        self.successes.lock().unwrap().push(record.clone());
    }

    fn on_sync_error(&self, message: &str, entry: &PendingEntry) {
        self.errors
            .lock()
            .unwrap()
            .push((message.to_string(), entry.clone()));
    }

    fn on_attempt_failed(&self, message: &str, entry: &PendingEntry) {
        self.failures
            .lock()
            .unwrap()
            .push((message.to_string(), entry.clone()));
    }
}
