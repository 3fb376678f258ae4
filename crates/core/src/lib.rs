// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ob-core: Shared library for the outbox offline sync engine
//!
//! This crate provides the pending-entry data model, the local durable
//! queue, and the wire protocol used by both the outbox CLI and the
//! ob-remote intake server.

pub mod clock;
pub mod entry;
pub mod error;
pub mod id;
pub mod jsonl;
pub mod protocol;
pub mod queue;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use entry::{EntryPatch, EntryStatus, PendingEntry, MAX_RETRY_ATTEMPTS};
pub use error::{Error, Result};
pub use protocol::{ClientMessage, ServerMessage, ServerRecord};
pub use queue::{EntryQueue, JsonlQueue, MemoryQueue, QueueFuture};
