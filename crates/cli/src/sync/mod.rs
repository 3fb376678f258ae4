// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync engine.
//!
//! Keeps payloads in the local queue until the remote intake server accepts
//! them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ Coordinator  │────►│  Submitter   │────►│  ob-remote  │
//! │ (drain pass) │◄────│   (trait)    │◄────│   server    │
//! └──────────────┘     └──────────────┘     └─────────────┘
//!     │      ▲
//!     ▼      │ online / offline
//! ┌────────┐ ┌──────────────┐
//! │ Queue  │ │ Connectivity │◄── reachability probe
//! │ (JSONL)│ │   Monitor    │
//! └────────┘ └──────────────┘
//! ```
//!
//! # Features
//!
//! - Durable queue shared with the CLI (see `ob_core::queue`)
//! - Sequential drain passes, one at a time across processes
//! - Per-entry retry ceiling with manual retry and discard
//! - Settle delay after reconnecting, plus a periodic tick
//! - Injectable submitter and queue traits for testing

mod connectivity;
mod coordinator;
mod lock;
mod submitter;

pub use connectivity::{probe_target, ConnectivityMonitor, ReachabilityProbe, Subscription};
pub use coordinator::{
    AttemptOutcome, NoopObserver, PassReport, SyncConfig, SyncCoordinator, SyncObserver,
    SyncOutcome, SyncState, SyncStatus, SyncTrigger,
};
pub use lock::{SyncClaim, SyncLock};
pub use submitter::{SubmitError, SubmitFuture, SubmitResult, Submitter, WebSocketSubmitter};

#[cfg(test)]
mod test_helpers;
