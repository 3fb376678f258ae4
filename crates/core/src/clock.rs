// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wall clock abstraction.
//!
//! Enqueue timestamps decide drain order and attempt timestamps are shown to
//! the user, so both are read through [`ClockSource`] to keep them injectable.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

/// Trait for getting the current wall clock time.
///
/// This allows injecting a controllable clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation backed by [`Utc::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// A clock that only moves when told to.
///
/// Millisecond resolution, matching what the queue persists.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `ms` milliseconds since the Unix epoch.
    pub fn at_millis(ms: i64) -> Self {
        ManualClock {
            now_ms: AtomicI64::new(ms),
        }
    }

    /// Moves the clock to `ms` milliseconds since the Unix epoch.
    pub fn set_millis(&self, ms: i64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }

    /// Moves the clock forward by `ms` milliseconds.
    pub fn advance_millis(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.now_ms.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Returns a shared handle to the system clock.
pub fn system() -> Arc<dyn ClockSource> {
    Arc::new(SystemClock)
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
