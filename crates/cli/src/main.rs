// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use obrs::Cli;

fn main() {
    let cli = Cli::parse();
    setup_logging(obrs::default_log_level(&cli.command));

    if let Err(e) = obrs::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn setup_logging(default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = obrs::env::log_filter()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
