// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod enqueue;
pub mod init;
pub mod list;
pub mod remove;
pub mod sync;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ob_core::JsonlQueue;
use tokio::runtime::Runtime;

use crate::config::{queue_path, resolve_state_dir, Config};
use crate::error::{Error, Result};

/// Everything a queue command needs: config, the open queue, and a runtime
/// to drive the async queue and sync APIs.
pub struct Context {
    pub state_dir: PathBuf,
    pub config: Config,
    pub queue: Arc<JsonlQueue>,
    runtime: Runtime,
}

impl Context {
    /// Resolve the state directory, load its config, and open the queue.
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        let state_dir = resolve_state_dir(dir);
        let config = Config::load(&state_dir)?;
        let queue = Arc::new(JsonlQueue::open(&queue_path(&state_dir))?);
        tracing::debug!(dir = %state_dir.display(), "opened state directory");
        Ok(Context {
            state_dir,
            config,
            queue,
            runtime: runtime()?,
        })
    }

    /// Retry ceiling from config.
    pub fn max_attempts(&self) -> u32 {
        self.config.sync.max_attempts
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Single-threaded runtime for one CLI invocation.
fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Runtime(e.to_string()))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
