// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed queue.
//!
//! Entries live in a JSONL file, one entry per line. Enqueue appends and
//! fsyncs; update and remove rewrite the file atomically. An advisory lock on
//! a sibling `.lock` file serializes access across processes.
//!
//! Waiting for that lock and the file I/O run on tokio's blocking pool, so a
//! queue held by another process never stalls the caller's runtime.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{charge_in, sort_oldest_first, EntryQueue, QueueFuture};
use crate::clock::{self, ClockSource};
use crate::entry::{EntryPatch, PendingEntry};
use crate::error::{Error, Result};
use crate::id::generate_unique_id;
use crate::jsonl;

/// Durable queue persisted as JSONL.
pub struct JsonlQueue {
    store: Arc<Store>,
}

/// The files behind a [`JsonlQueue`], shared with its blocking tasks.
struct Store {
    /// Path to the queue file.
    path: PathBuf,
    /// Path to the advisory lock file.
    lock_path: PathBuf,
    clock: Arc<dyn ClockSource>,
}

impl JsonlQueue {
    /// Create or open a queue at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_clock(path, clock::system())
    }

    /// Create or open a queue with a custom clock source.
    pub fn with_clock(path: &Path, clock: Arc<dyn ClockSource>) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::unavailable(parent, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::unavailable(path, e))?;

        Ok(JsonlQueue {
            store: Arc::new(Store {
                path: path.to_path_buf(),
                lock_path: path.with_extension("lock"),
                clock,
            }),
        })
    }

    /// Runs `op` against the store on the blocking pool.
    fn run<T, F>(&self, op: F) -> QueueFuture<'_, T>
    where
        T: Send + 'static,
        F: FnOnce(&Store) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || op(&store))
                .await
                .map_err(|e| Error::StorageUnavailable(format!("queue task failed: {}", e)))?
        })
    }
}

impl Store {
    /// Takes the advisory lock; released when the returned file is dropped.
    fn lock(&self, exclusive: bool) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| Error::unavailable(&self.lock_path, e))?;
        let locked = if exclusive {
            fs2::FileExt::lock_exclusive(&file)
        } else {
            fs2::FileExt::lock_shared(&file)
        };
        locked.map_err(|e| Error::unavailable(&self.lock_path, e))?;
        Ok(file)
    }

    fn read(&self) -> Result<Vec<PendingEntry>> {
        jsonl::read_all(&self.path)
    }

    /// Rewrites the queue; I/O failures mean the store is unavailable.
    fn write(&self, entries: &[PendingEntry]) -> Result<()> {
        jsonl::replace_all(&self.path, entries).map_err(|e| self.as_unavailable(e))
    }

    fn as_unavailable(&self, err: Error) -> Error {
        match err {
            Error::Io(e) => Error::unavailable(&self.path, e),
            other => other,
        }
    }

    fn enqueue(&self, payload: Value) -> Result<String> {
        let _lock = self.lock(true)?;
        let existing = self.read()?;
        let created_at = self.clock.now();
        let id = generate_unique_id(&created_at, |candidate| {
            existing.iter().any(|e| e.id == candidate)
        });

        let entry = PendingEntry::new(id.clone(), payload, created_at);
        jsonl::append(&self.path, &entry).map_err(|e| self.as_unavailable(e))?;
        tracing::debug!(id = %id, "enqueued pending entry");
        Ok(id)
    }

    fn list(&self) -> Result<Vec<PendingEntry>> {
        let _lock = self.lock(false)?;
        let mut entries = self.read()?;
        sort_oldest_first(&mut entries);
        Ok(entries)
    }

    fn get(&self, id: &str) -> Result<Option<PendingEntry>> {
        let _lock = self.lock(false)?;
        Ok(self.read()?.into_iter().find(|e| e.id == id))
    }

    fn update(&self, id: &str, patch: &EntryPatch) -> Result<PendingEntry> {
        let _lock = self.lock(true)?;
        let mut entries = self.read()?;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::EntryNotFound(id.to_string()))?;
        entry.apply(patch);
        let updated = entry.clone();
        self.write(&entries)?;
        Ok(updated)
    }

    fn charge(
        &self,
        id: &str,
        max_attempts: u32,
        at: DateTime<Utc>,
    ) -> Result<Option<PendingEntry>> {
        let _lock = self.lock(true)?;
        let mut entries = self.read()?;
        let charged = charge_in(&mut entries, id, max_attempts, at)?;
        if charged.is_some() {
            self.write(&entries)?;
        }
        Ok(charged)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let _lock = self.lock(true)?;
        let mut entries = self.read()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write(&entries)?;
        tracing::debug!(id, "removed pending entry");
        Ok(true)
    }

    fn clear(&self) -> Result<usize> {
        let _lock = self.lock(true)?;
        let removed = self.read()?.len();
        self.write(&[])?;
        Ok(removed)
    }
}

impl EntryQueue for JsonlQueue {
    fn enqueue(&self, payload: Value) -> QueueFuture<'_, String> {
        self.run(move |store| store.enqueue(payload))
    }

    fn list(&self) -> QueueFuture<'_, Vec<PendingEntry>> {
        self.run(|store| store.list())
    }

    fn count(&self) -> QueueFuture<'_, usize> {
        self.run(|store| {
            let _lock = store.lock(false)?;
            Ok(store.read()?.len())
        })
    }

    fn get(&self, id: &str) -> QueueFuture<'_, Option<PendingEntry>> {
        let id = id.to_string();
        self.run(move |store| store.get(&id))
    }

    fn update(&self, id: &str, patch: EntryPatch) -> QueueFuture<'_, PendingEntry> {
        let id = id.to_string();
        self.run(move |store| store.update(&id, &patch))
    }

    fn charge(
        &self,
        id: &str,
        max_attempts: u32,
        at: DateTime<Utc>,
    ) -> QueueFuture<'_, Option<PendingEntry>> {
        let id = id.to_string();
        self.run(move |store| store.charge(&id, max_attempts, at))
    }

    fn remove(&self, id: &str) -> QueueFuture<'_, bool> {
        let id = id.to_string();
        self.run(move |store| store.remove(&id))
    }

    fn clear(&self) -> QueueFuture<'_, usize> {
        self.run(|store| store.clear())
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
