// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::config::{init_state_dir, resolve_state_dir};
use crate::error::Result;

pub fn run(dir: Option<&Path>, remote: Option<&str>) -> Result<()> {
    let state_dir = resolve_state_dir(dir);
    let config = init_state_dir(&state_dir, remote)?;

    println!("Initialized outbox at {}", state_dir.display());
    match config.remote_url() {
        Some(url) => println!("Remote: {}", url),
        None => {
            println!("Remote: none (entries will queue until one is configured)");
            println!("  hint: run 'outbox init --remote ws://host:port' to add one");
        }
    }
    Ok(())
}
