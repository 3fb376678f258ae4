// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending entry identifiers.
//!
//! Format: `{created_at_ms}-{hash}` where hash is the first 8 hex chars of
//! SHA256(created_at + pid + sequence). Unique per device, not globally.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate an entry ID for the given enqueue timestamp.
pub fn generate_id(created_at: &DateTime<Utc>) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let input = format!("{}{}{}", created_at.to_rfc3339(), std::process::id(), seq);
    let hash = Sha256::digest(input.as_bytes());
    format!("{}-{}", created_at.timestamp_millis(), hex::encode(&hash[..4]))
}

/// Generate a unique ID, handling collisions by appending an incrementing suffix.
pub fn generate_unique_id<F>(created_at: &DateTime<Utc>, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = generate_id(created_at);

    if !exists(&base_id) {
        return base_id;
    }

    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
