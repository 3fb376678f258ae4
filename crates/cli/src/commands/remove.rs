// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ob_core::EntryQueue;

use super::Context;
use crate::error::Result;

/// Discard entries by id. Unknown ids are reported but are not an error.
pub fn run(ctx: &Context, ids: &[String]) -> Result<()> {
    for id in ids {
        if ctx.block_on(ctx.queue.remove(id))? {
            tracing::info!(id = %id, "discarded entry");
            println!("Removed {}", id);
        } else {
            println!("Not queued: {}", id);
        }
    }
    Ok(())
}

/// Discard every entry.
pub fn clear(ctx: &Context) -> Result<()> {
    let removed = ctx.block_on(ctx.queue.clear())?;
    let noun = if removed == 1 { "entry" } else { "entries" };
    println!("Cleared {} {}", removed, noun);
    Ok(())
}
