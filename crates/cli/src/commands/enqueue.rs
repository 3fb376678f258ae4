// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Read;

use ob_core::EntryQueue;
use serde_json::Value;

use super::Context;
use crate::error::{Error, Result};

/// Queue one payload and print its id.
pub fn run(ctx: &Context, raw: &str) -> Result<()> {
    let payload = if raw == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        parse_payload(&buf)?
    } else {
        parse_payload(raw)?
    };

    let id = ctx.block_on(ctx.queue.enqueue(payload))?;
    tracing::info!(id, "queued entry");
    println!("{}", id);
    Ok(())
}

/// Parse a payload argument as a single JSON value.
pub fn parse_payload(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidPayload("empty input".to_string()));
    }
    serde_json::from_str(trimmed).map_err(|e| Error::InvalidPayload(e.to_string()))
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
