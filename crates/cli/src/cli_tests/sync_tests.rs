// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use super::*;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_retry_takes_one_id() {
    let cli = parse(&["outbox", "retry", "1700000000000-abcd1234"]).unwrap();
    match cli.command {
        Command::Retry { id } => assert_eq!(id, "1700000000000-abcd1234"),
        _ => panic!("Expected Retry command"),
    }
    assert!(parse(&["outbox", "retry"]).is_err());
    assert!(parse(&["outbox", "retry", "a", "b"]).is_err());
}

#[test]
fn test_sync_and_watch() {
    assert!(matches!(parse(&["outbox", "sync"]).unwrap().command, Command::Sync));
    assert!(matches!(parse(&["outbox", "watch"]).unwrap().command, Command::Watch));
}

#[test]
fn test_status_output() {
    let cli = parse(&["outbox", "status", "-o", "json"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Status {
            output: OutputFormat::Json
        }
    ));
}
