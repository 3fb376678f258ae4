// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
use common::*;

fn init_with_remote(temp: &TempDir, url: &str) {
    outbox(temp)
        .args(["init", "--remote", url])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Remote: {url}")));
}

#[test]
fn sync_without_remote_fails_with_hint() {
    let temp = TempDir::new().unwrap();
    enqueue(&temp, "{}");

    outbox(&temp)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no remote configured"))
        .stderr(predicate::str::contains("outbox init --remote"));
}

#[test]
fn init_rejects_non_websocket_remote() {
    let temp = TempDir::new().unwrap();
    outbox(&temp)
        .args(["init", "--remote", "http://localhost:7890"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be ws:// or wss://"));
}

#[test]
fn sync_while_unreachable_keeps_entries_untouched() {
    let temp = TempDir::new().unwrap();
    init_with_remote(&temp, &format!("ws://127.0.0.1:{}", closed_port()));
    enqueue(&temp, r#"{"n": 1}"#);

    outbox(&temp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Remote unreachable"));

    let entries = list_json(&temp);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["attempts"], 0);
}

#[test]
fn sync_delivers_and_records_failures() {
    let server = IntakeServer::start(|p| p["bad"] == true);
    let temp = TempDir::new().unwrap();
    init_with_remote(&temp, &server.url);
    enqueue(&temp, r#"{"h": 1}"#);
    let bad = enqueue(&temp, r#"{"h": 2, "bad": true}"#);
    enqueue(&temp, r#"{"h": 3}"#);

    outbox(&temp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("synced 2, failed 1, needs attention 0"));

    assert_eq!(
        server.accepted(),
        vec![serde_json::json!({"h": 1}), serde_json::json!({"h": 3})]
    );
    let entries = list_json(&temp);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], bad.as_str());
    assert_eq!(entries[0]["attempts"], 1);
    assert!(entries[0]["lastError"]
        .as_str()
        .unwrap()
        .contains("refused by test server"));
}

#[test]
fn exhausted_entry_needs_attention_until_retried() {
    let server = IntakeServer::start(|p| p["bad"] == true);
    let temp = TempDir::new().unwrap();
    init_with_remote(&temp, &server.url);
    std::fs::write(
        temp.path().join("config.toml"),
        format!("[remote]\nurl = \"{}\"\n\n[sync]\nmax_attempts = 1\n", server.url),
    )
    .unwrap();
    let id = enqueue(&temp, r#"{"bad": true}"#);

    outbox(&temp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("needs attention: {id}")));

    outbox(&temp)
        .args(["list", "--stuck"])
        .assert()
        .success()
        .stdout(predicate::str::contains(&id))
        .stdout(predicate::str::contains("needs-attention"));

    // The next pass leaves it alone.
    outbox(&temp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped 1"));

    outbox(&temp)
        .args(["retry", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("submission failed"));
}

#[test]
fn retry_submits_entry() {
    let server = IntakeServer::start(|_| false);
    let temp = TempDir::new().unwrap();
    init_with_remote(&temp, &server.url);
    let id = enqueue(&temp, r#"{"again": 1}"#);

    outbox(&temp)
        .args(["retry", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("synced as rec-1"));
    outbox(&temp).arg("count").assert().success().stdout("0\n");
}

#[test]
fn retry_unknown_id_fails() {
    let server = IntakeServer::start(|_| false);
    let temp = TempDir::new().unwrap();
    init_with_remote(&temp, &server.url);

    outbox(&temp)
        .args(["retry", "missing-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pending entry not found: missing-id"));
}

#[test]
fn status_reports_counts() {
    let server = IntakeServer::start(|_| false);
    let temp = TempDir::new().unwrap();
    init_with_remote(&temp, &server.url);
    enqueue(&temp, "1");

    let output = outbox(&temp)
        .args(["status", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["pending"], 1);
    assert_eq!(status["needsAttention"], 0);
    assert_eq!(status["online"], true);
    assert_eq!(status["remote"], server.url.as_str());
}
