// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! obrs - the outbox CLI library.
//!
//! Queues JSON payloads durably on disk and delivers them to an `ob-remote`
//! intake server when it is reachable.
//!
//! # Main Components
//!
//! - [`sync`] - Sync coordinator, connectivity monitor, and WebSocket submitter
//! - [`Config`] - State directory configuration (remote URL, sync tuning)
//! - [`Error`] - Error types for all CLI operations
//!
//! The durable queue and pending-entry model live in `ob_core`.
//!
//! ```rust,ignore
//! use obrs::{run, Cli};
//! use clap::Parser;
//!
//! run(Cli::parse())?;
//! ```

mod cli;
mod commands;
mod display;
pub mod env;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat};
pub use config::{Config, RemoteConfig, SyncSettings};
pub use error::{Error, Result};

use commands::Context;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let dir = cli.dir.as_deref();
    match cli.command {
        Command::Init { remote } => commands::init::run(dir, remote.as_deref()),
        Command::Enqueue { payload } => commands::enqueue::run(&Context::open(dir)?, &payload),
        Command::List { stuck, output } => commands::list::run(&Context::open(dir)?, stuck, output),
        Command::Count => commands::list::count(&Context::open(dir)?),
        Command::Remove { ids } => commands::remove::run(&Context::open(dir)?, &ids),
        Command::Clear => commands::remove::clear(&Context::open(dir)?),
        Command::Retry { id } => commands::sync::retry(&Context::open(dir)?, &id),
        Command::Sync => commands::sync::run(&Context::open(dir)?),
        Command::Watch => commands::sync::watch(&Context::open(dir)?),
        Command::Status { output } => commands::sync::status(&Context::open(dir)?, output),
    }
}

/// Default log filter for a command when `OUTBOX_LOG` is unset.
pub fn default_log_level(command: &Command) -> &'static str {
    match command {
        Command::Watch => "info",
        _ => "warn",
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
