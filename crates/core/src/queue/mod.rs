// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local durable queue of entries awaiting submission.
//!
//! [`EntryQueue`] is the storage seam the sync engine drains. Every operation
//! touches exactly one entry or the whole collection, and each store
//! serializes its own reads and writes, so a single-key read-modify-write
//! (such as [`EntryQueue::charge`]) is atomic without extra locking upstream,
//! even when another process shares the store.
//!
//! Two stores are provided:
//! - [`JsonlQueue`]: fsynced JSONL file, shared safely between processes
//! - [`MemoryQueue`]: in-memory fake with the same contract

mod file;
mod memory;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::entry::{EntryPatch, PendingEntry};
use crate::error::{Error, Result};

pub use file::JsonlQueue;
pub use memory::MemoryQueue;

/// Future returned by [`EntryQueue`] operations.
pub type QueueFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Storage for [`PendingEntry`] records, keyed by id and ordered by `created_at`.
pub trait EntryQueue: Send + Sync {
    /// Stores a new entry with no attempts charged and returns its id.
    ///
    /// Fails with [`Error::StorageUnavailable`](crate::Error::StorageUnavailable)
    /// if the backing store cannot be written.
    fn enqueue(&self, payload: Value) -> QueueFuture<'_, String>;

    /// Returns all entries, oldest first.
    fn list(&self) -> QueueFuture<'_, Vec<PendingEntry>>;

    /// Returns the number of stored entries.
    fn count(&self) -> QueueFuture<'_, usize>;

    /// Returns the entry with the given id, if any.
    fn get(&self, id: &str) -> QueueFuture<'_, Option<PendingEntry>>;

    /// Merges `patch` into the entry and returns the result.
    ///
    /// Fails with [`Error::EntryNotFound`](crate::Error::EntryNotFound) if no
    /// entry has that id.
    fn update(&self, id: &str, patch: EntryPatch) -> QueueFuture<'_, PendingEntry>;

    /// Charges one attempt against the entry, started at `at`, unless it
    /// already reached `max_attempts`.
    ///
    /// The check and the increment happen under the store's lock, so the
    /// count only grows from what is stored. Returns `None` for an entry at
    /// the ceiling, and fails with
    /// [`Error::EntryNotFound`](crate::Error::EntryNotFound) for unknown ids.
    fn charge(
        &self,
        id: &str,
        max_attempts: u32,
        at: DateTime<Utc>,
    ) -> QueueFuture<'_, Option<PendingEntry>>;

    /// Deletes the entry. Missing ids are not an error.
    ///
    /// Returns true if an entry was removed.
    fn remove(&self, id: &str) -> QueueFuture<'_, bool>;

    /// Deletes every entry and returns how many there were.
    fn clear(&self) -> QueueFuture<'_, usize>;
}

/// Charges `id` in `entries` if it is still below the ceiling.
fn charge_in(
    entries: &mut [PendingEntry],
    id: &str,
    max_attempts: u32,
    at: DateTime<Utc>,
) -> Result<Option<PendingEntry>> {
    let entry = entries
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| Error::EntryNotFound(id.to_string()))?;
    if !entry.is_eligible(max_attempts) {
        return Ok(None);
    }
    entry.charge(at);
    Ok(Some(entry.clone()))
}

/// Orders entries by enqueue time. The sort is stable, so entries sharing a
/// timestamp keep their insertion order.
fn sort_oldest_first(entries: &mut [PendingEntry]) {
    entries.sort_by_key(|e| e.created_at);
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
