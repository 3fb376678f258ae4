// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process claim on drain passes.
//!
//! Several `outbox` processes may share one state directory. An advisory
//! lock on `sync.lock` keeps their passes and manual retries from running
//! at the same time.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use ob_core::{Error, Result};

/// Advisory lock file guarding drain passes.
#[derive(Debug, Clone)]
pub struct SyncLock {
    path: PathBuf,
}

/// A held claim on a [`SyncLock`]. Released on drop.
#[derive(Debug)]
pub struct SyncClaim {
    _file: File,
}

impl SyncLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SyncLock { path: path.into() }
    }

    fn open(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| unavailable(&self.path, e))
    }

    /// Claims the lock if no one holds it; `None` if another pass does.
    pub fn try_claim(&self) -> Result<Option<SyncClaim>> {
        let file = self.open()?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(SyncClaim { _file: file })),
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(unavailable(&self.path, e)),
        }
    }

    /// Waits for the lock on the blocking pool.
    pub async fn claim(&self) -> Result<SyncClaim> {
        let file = self.open()?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || match file.lock_exclusive() {
            Ok(()) => Ok(SyncClaim { _file: file }),
            Err(e) => Err(unavailable(&path, e)),
        })
        .await
        .map_err(|e| Error::StorageUnavailable(format!("sync lock task failed: {}", e)))?
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn unavailable(path: &Path, err: io::Error) -> Error {
    Error::StorageUnavailable(format!("{}: {}", path.display(), err))
}
