// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ob_core::PendingEntry;
use serde_json::Value;

use crate::error::Result;
use crate::sync::{PassReport, SyncStatus};

/// Maximum width of the payload preview in list output.
const PREVIEW_WIDTH: usize = 60;

/// Truncate to `width` characters, marking the cut with `...`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Format one entry for `list` text output.
///
/// Output format:
/// ```text
/// 1700000000000-a1b2c3d4  pending  1/5  {"note":"hi"}
///     last error: connection failed: refused
/// ```
pub fn format_entry(entry: &PendingEntry, max_attempts: u32) -> Vec<String> {
    let payload = truncate(&entry.payload.to_string(), PREVIEW_WIDTH);
    let mut lines = vec![format!(
        "{}  {}  {}/{}  {}",
        entry.id,
        entry.status(max_attempts),
        entry.attempts,
        max_attempts,
        payload
    )];
    if let Some(err) = &entry.last_error {
        lines.push(format!("    last error: {err}"));
    }
    lines
}

/// Entries as a JSON array, each object carrying a computed `status`.
pub fn format_entries_json(entries: &[PendingEntry], max_attempts: u32) -> Result<String> {
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut value = serde_json::to_value(entry)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "status".to_string(),
                Value::from(entry.status(max_attempts).as_str()),
            );
        }
        out.push(value);
    }
    Ok(serde_json::to_string_pretty(&out)?)
}

/// One-line summary of a drain pass.
pub fn format_report(report: &PassReport) -> String {
    let mut line = format!(
        "synced {}, failed {}, needs attention {}",
        report.succeeded, report.failed, report.exhausted
    );
    if report.skipped > 0 {
        line.push_str(&format!(", skipped {}", report.skipped));
    }
    if report.aborted {
        line.push_str(" (stopped: connectivity lost)");
    }
    line
}

/// Multi-line `status` text output.
pub fn format_status(status: &SyncStatus, remote: Option<&str>) -> Vec<String> {
    let reachability = match (remote, status.online) {
        (None, _) => "not configured".to_string(),
        (Some(url), true) => format!("{url} (reachable)"),
        (Some(url), false) => format!("{url} (unreachable)"),
    };
    vec![
        format!("remote:          {reachability}"),
        format!("pending:         {}", status.pending),
        format!("needs attention: {}", status.needs_attention),
    ]
}

/// `status` as a JSON object.
pub fn format_status_json(status: &SyncStatus, remote: Option<&str>) -> Result<String> {
    let value = serde_json::json!({
        "remote": remote,
        "online": status.online,
        "pending": status.pending,
        "needsAttention": status.needs_attention,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
