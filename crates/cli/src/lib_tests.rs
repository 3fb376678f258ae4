// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Tests for the public `run()` function.
//!
//! These drive `run()` against a temporary state directory. Output formatting
//! is covered by the binary tests in `tests/`.

use crate::{default_log_level, run, Cli, Command, Error, OutputFormat};
use ob_core::{EntryQueue, JsonlQueue};
use std::path::Path;
use tempfile::TempDir;

fn run_in(dir: &Path, command: Command) -> crate::Result<()> {
    run(Cli {
        dir: Some(dir.to_path_buf()),
        command,
    })
}

fn queued(dir: &Path) -> usize {
    let queue = JsonlQueue::open(&dir.join("queue.jsonl")).unwrap();
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(queue.count())
        .unwrap()
}

#[test]
fn test_init_writes_config() {
    let temp = TempDir::new().unwrap();
    run_in(
        temp.path(),
        Command::Init {
            remote: Some("ws://127.0.0.1:1".to_string()),
        },
    )
    .unwrap();
    let config = crate::Config::load(temp.path()).unwrap();
    assert_eq!(config.remote_url(), Some("ws://127.0.0.1:1"));
}

#[test]
fn test_enqueue_then_clear() {
    let temp = TempDir::new().unwrap();
    for n in 0..3 {
        run_in(
            temp.path(),
            Command::Enqueue {
                payload: format!("{{\"n\": {n}}}"),
            },
        )
        .unwrap();
    }
    assert_eq!(queued(temp.path()), 3);

    run_in(temp.path(), Command::Clear).unwrap();
    assert_eq!(queued(temp.path()), 0);
}

#[test]
fn test_enqueue_invalid_json_queues_nothing() {
    let temp = TempDir::new().unwrap();
    let err = run_in(
        temp.path(),
        Command::Enqueue {
            payload: "not json".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidPayload(_)));
    assert_eq!(queued(temp.path()), 0);
}

#[test]
fn test_remove_unknown_id_is_ok() {
    let temp = TempDir::new().unwrap();
    run_in(
        temp.path(),
        Command::Remove {
            ids: vec!["nope".to_string()],
        },
    )
    .unwrap();
}

#[test]
fn test_sync_commands_require_remote() {
    let temp = TempDir::new().unwrap();
    let err = run_in(temp.path(), Command::Sync).unwrap_err();
    assert!(matches!(err, Error::NoRemote));

    let err = run_in(
        temp.path(),
        Command::Retry {
            id: "x".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::NoRemote));
}

#[test]
fn test_status_without_remote() {
    let temp = TempDir::new().unwrap();
    run_in(
        temp.path(),
        Command::Status {
            output: OutputFormat::Json,
        },
    )
    .unwrap();
}

#[test]
fn test_default_log_level() {
    assert_eq!(default_log_level(&Command::Watch), "info");
    assert_eq!(default_log_level(&Command::Count), "warn");
}
