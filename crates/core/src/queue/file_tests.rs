// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests specific to the JSONL-backed queue.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use super::*;
use fs2::FileExt;
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn open_creates_missing_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/state/queue.jsonl");

    JsonlQueue::open(&path).unwrap();

    assert!(path.exists());
}

#[test]
fn open_under_a_file_is_storage_unavailable() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let err = JsonlQueue::open(&blocker.join("queue.jsonl")).err().unwrap();
    assert!(matches!(err, Error::StorageUnavailable(_)));
}

#[tokio::test]
async fn entries_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("queue.jsonl");

    let id = {
        let queue = JsonlQueue::open(&path).unwrap();
        let id = queue.enqueue(json!({"h": 1})).await.unwrap();
        queue.update(&id, EntryPatch::failure("offline")).await.unwrap();
        id
    };

    let queue = JsonlQueue::open(&path).unwrap();
    let entries = queue.list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    assert_eq!(entries[0].last_error.as_deref(), Some("offline"));
}

#[tokio::test]
async fn two_handles_share_one_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("queue.jsonl");
    let a = JsonlQueue::open(&path).unwrap();
    let b = JsonlQueue::open(&path).unwrap();

    let first = a.enqueue(json!(1)).await.unwrap();
    b.enqueue(json!(2)).await.unwrap();
    b.remove(&first).await.unwrap();

    let entries = a.list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].payload, json!(2));
}

#[tokio::test]
async fn corrupted_queue_file_propagates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("queue.jsonl");
    let queue = JsonlQueue::open(&path).unwrap();
    queue.enqueue(json!(1)).await.unwrap();

    use std::io::Write;
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, "{{truncated").unwrap();

    let err = queue.list().await.unwrap_err();
    assert!(matches!(err, Error::CorruptedData(_)));
}

#[tokio::test]
async fn lock_file_sits_next_to_queue() {
    let dir = tempdir().unwrap();
    let queue = JsonlQueue::open(&dir.path().join("queue.jsonl")).unwrap();
    queue.count().await.unwrap();

    assert!(dir.path().join("queue.lock").exists());
}

#[tokio::test]
async fn lock_held_elsewhere_does_not_stall_the_runtime() {
    let dir = tempdir().unwrap();
    let queue = Arc::new(JsonlQueue::open(&dir.path().join("queue.jsonl")).unwrap());
    queue.enqueue(json!(1)).await.unwrap();

    let holder = File::create(dir.path().join("queue.lock")).unwrap();
    holder.lock_exclusive().unwrap();

    let waiting = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.count().await })
    };
    // The single runtime thread keeps running timers while the count waits.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiting.is_finished());

    holder.unlock().unwrap();
    assert_eq!(waiting.await.unwrap().unwrap(), 1);
}
