// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL (JSON Lines) file utilities.
//!
//! Each record is stored as a single JSON line. Appends are fsynced; full
//! rewrites go through a sibling temp file and a rename so readers only ever
//! see the old or the new content.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Appends a record to a JSONL file with fsync for durability.
pub fn append<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let json = serde_json::to_string(record)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{json}")?;
    file.sync_all()?;
    Ok(())
}

/// Reads all records from a JSONL file.
///
/// Skips blank lines and returns an empty vec if the file doesn't exist.
/// A line that fails to parse is reported with its 1-based line number.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            Error::CorruptedData(format!("{} line {}: {}", path.display(), idx + 1, e))
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Replaces the contents of a JSONL file with `records`.
///
/// Writes to `<path>.tmp`, fsyncs, then renames over `path`.
pub fn replace_all<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{json}")?;
        }
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
