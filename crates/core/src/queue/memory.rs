// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory queue.
//!
//! Same contract as the file store without the disk. The availability switch
//! makes every operation fail with `StorageUnavailable`, to exercise callers'
//! fallback paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{charge_in, sort_oldest_first, EntryQueue, QueueFuture};
use crate::clock::{self, ClockSource};
use crate::entry::{EntryPatch, PendingEntry};
use crate::error::{Error, Result};
use crate::id::generate_unique_id;

/// Non-durable queue held in process memory.
pub struct MemoryQueue {
    entries: Mutex<Vec<PendingEntry>>,
    available: AtomicBool,
    clock: Arc<dyn ClockSource>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::with_clock(clock::system())
    }

    pub fn with_clock(clock: Arc<dyn ClockSource>) -> Self {
        MemoryQueue {
            entries: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            clock,
        }
    }

    /// Simulates the backing store going away (`false`) or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn entries(&self) -> Result<MutexGuard<'_, Vec<PendingEntry>>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::StorageUnavailable("in-memory queue is offline".into()));
        }
        Ok(self.entries.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn enqueue_sync(&self, payload: Value) -> Result<String> {
        let mut entries = self.entries()?;
        let created_at = self.clock.now();
        let id = generate_unique_id(&created_at, |candidate| {
            entries.iter().any(|e| e.id == candidate)
        });
        entries.push(PendingEntry::new(id.clone(), payload, created_at));
        Ok(id)
    }

    fn update_sync(&self, id: &str, patch: &EntryPatch) -> Result<PendingEntry> {
        let mut entries = self.entries()?;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::EntryNotFound(id.to_string()))?;
        entry.apply(patch);
        Ok(entry.clone())
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryQueue for MemoryQueue {
    fn enqueue(&self, payload: Value) -> QueueFuture<'_, String> {
        Box::pin(async move { self.enqueue_sync(payload) })
    }

    fn list(&self) -> QueueFuture<'_, Vec<PendingEntry>> {
        Box::pin(async move {
            let mut entries = self.entries()?.clone();
            sort_oldest_first(&mut entries);
            Ok(entries)
        })
    }

    fn count(&self) -> QueueFuture<'_, usize> {
        Box::pin(async move { Ok(self.entries()?.len()) })
    }

    fn get(&self, id: &str) -> QueueFuture<'_, Option<PendingEntry>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.entries()?.iter().find(|e| e.id == id).cloned()) })
    }

    fn update(&self, id: &str, patch: EntryPatch) -> QueueFuture<'_, PendingEntry> {
        let id = id.to_string();
        Box::pin(async move { self.update_sync(&id, &patch) })
    }

    fn charge(
        &self,
        id: &str,
        max_attempts: u32,
        at: DateTime<Utc>,
    ) -> QueueFuture<'_, Option<PendingEntry>> {
        let id = id.to_string();
        Box::pin(async move { charge_in(&mut self.entries()?, &id, max_attempts, at) })
    }

    fn remove(&self, id: &str) -> QueueFuture<'_, bool> {
        let id = id.to_string();
        Box::pin(async move {
            let mut entries = self.entries()?;
            let before = entries.len();
            entries.retain(|e| e.id != id);
            Ok(entries.len() != before)
        })
    }

    fn clear(&self) -> QueueFuture<'_, usize> {
        Box::pin(async move {
            let mut entries = self.entries()?;
            let removed = entries.len();
            entries.clear();
            Ok(removed)
        })
    }
}
