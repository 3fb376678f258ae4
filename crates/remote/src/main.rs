// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ob-remote: WebSocket intake server for outbox clients.
//!
//! Accepts submitted payloads, assigns each a record id, and appends it to a
//! durable JSONL log before answering.

mod server;
#[cfg(test)]
mod server_tests;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// ob-remote: Intake server for the outbox offline sync engine
#[derive(Parser, Debug)]
#[command(name = "ob-remote")]
#[command(about = "WebSocket intake server for outbox clients")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for the record log
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Top-level field every payload must carry (repeatable)
    #[arg(short, long = "require", value_name = "FIELD")]
    require: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the flag
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting ob-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());
    if !args.require.is_empty() {
        info!("  Required fields: {}", args.require.join(", "));
    }

    let state = state::IntakeState::open(&args.data, args.require)?;
    info!("  Record log: {}", state.records_path().display());

    server::run(args.bind, state).await?;

    Ok(())
}
