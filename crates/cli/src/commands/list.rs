// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ob_core::{EntryQueue, PendingEntry};

use super::Context;
use crate::cli::OutputFormat;
use crate::display::{format_entries_json, format_entry};
use crate::error::Result;

pub fn run(ctx: &Context, stuck: bool, output: OutputFormat) -> Result<()> {
    let entries = ctx.block_on(ctx.queue.list())?;
    let entries = filter_entries(entries, stuck, ctx.max_attempts());

    match output {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No pending entries");
            }
            for entry in &entries {
                for line in format_entry(entry, ctx.max_attempts()) {
                    println!("{}", line);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", format_entries_json(&entries, ctx.max_attempts())?);
        }
    }
    Ok(())
}

/// Print the number of pending entries.
pub fn count(ctx: &Context) -> Result<()> {
    let count = ctx.block_on(ctx.queue.count())?;
    println!("{}", count);
    Ok(())
}

/// Keep only entries at the retry ceiling when `stuck` is set.
pub(crate) fn filter_entries(
    entries: Vec<PendingEntry>,
    stuck: bool,
    max_attempts: u32,
) -> Vec<PendingEntry> {
    if !stuck {
        return entries;
    }
    entries
        .into_iter()
        .filter(|e| !e.is_eligible(max_attempts))
        .collect()
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
