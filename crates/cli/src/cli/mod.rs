// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// Custom help template that groups commands into sections
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Queue:
  enqueue     Queue a JSON payload for submission
  list        List pending entries
  count       Print the number of pending entries
  remove      Discard pending entries
  clear       Discard every pending entry

Sync:
  sync        Run one drain pass now
  retry       Reset and resubmit an entry
  watch       Sync continuously as connectivity allows
  status      Show queue and connectivity status

Setup:
  init        Create the state directory and config";

const QUICKSTART_HELP: &str = "\
Get started:
  outbox init --remote ws://localhost:7890
  outbox enqueue '{\"note\": \"hello\"}'
  outbox list
  outbox sync";

#[derive(Parser)]
#[command(name = "outbox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "An offline-first outbox: queue JSON payloads, deliver them when online")]
#[command(
    long_about = "An offline-first outbox.\n\n\
    Payloads are queued durably on disk and submitted to an ob-remote intake server \
    whenever it is reachable, with per-entry retry limits."
)]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// State directory (default: $OUTBOX_DIR, then $XDG_STATE_HOME/outbox)
    #[arg(short = 'd', long = "dir", global = true, value_name = "path")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the state directory and config
    Init {
        /// WebSocket URL of the intake server (ws:// or wss://)
        #[arg(long, value_name = "URL")]
        remote: Option<String>,
    },

    /// Queue a JSON payload for submission
    #[command(visible_alias = "add")]
    Enqueue {
        /// Payload as JSON, or '-' to read it from stdin
        #[arg(value_name = "JSON")]
        payload: String,
    },

    /// List pending entries, oldest first
    #[command(alias = "ls")]
    List {
        /// Only show entries that exhausted their retries
        #[arg(long)]
        stuck: bool,

        /// Output format (text, json)
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the number of pending entries
    Count,

    /// Discard pending entries without submitting them
    #[command(alias = "rm")]
    Remove {
        /// Entry ids
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },

    /// Discard every pending entry
    Clear,

    /// Reset an entry's retries and submit it once
    Retry {
        /// Entry id
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Run one drain pass now
    Sync,

    /// Sync continuously as connectivity allows, until interrupted
    Watch,

    /// Show queue and connectivity status
    Status {
        /// Output format (text, json)
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
