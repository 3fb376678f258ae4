// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitor.
//!
//! Exposes the current reachability signal and notifies subscribers of
//! online/offline transitions. "Online" only means the signal source could
//! reach the network; it is not a promise that the server will answer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

struct MonitorInner {
    state: watch::Sender<bool>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
}

/// Shared handle to the reachability signal. Clones observe the same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Arc<MonitorInner>,
}

impl ConnectivityMonitor {
    /// Create a monitor starting in the given state.
    pub fn new(online: bool) -> Self {
        let (state, _) = watch::channel(online);
        ConnectivityMonitor {
            inner: Arc::new(MonitorInner {
                state,
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current reachability.
    pub fn is_online(&self) -> bool {
        *self.inner.state.borrow()
    }

    /// Feed a new reading from the signal source.
    ///
    /// Subscribers are called only when the state actually changes. Returns
    /// true if it did.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.inner.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if !changed {
            return false;
        }

        tracing::info!(online, "connectivity changed");
        // Call outside the lock so a callback may subscribe or unsubscribe.
        let listeners: Vec<Listener> = self
            .listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(online);
        }
        true
    }

    /// Register a callback for transitions. It receives the new state.
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners().push((id, Arc::new(callback)));
        Subscription {
            id,
            monitor: Arc::downgrade(&self.inner),
        }
    }

    /// Async view of the state for event loops.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.inner.state.subscribe()
    }

    fn listeners(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Listener)>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

/// Registration handle returned by [`ConnectivityMonitor::subscribe`].
pub struct Subscription {
    id: u64,
    monitor: Weak<MonitorInner>,
}

impl Subscription {
    /// Deregister the callback.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.monitor.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// Extracts `host:port` from a `ws://` or `wss://` URL.
///
/// Missing ports default to 80 and 443. Returns `None` for other schemes or
/// an empty host.
pub fn probe_target(url: &str) -> Option<String> {
    let (rest, default_port) = if let Some(rest) = url.strip_prefix("ws://") {
        (rest, 80)
    } else if let Some(rest) = url.strip_prefix("wss://") {
        (rest, 443)
    } else {
        return None;
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit('@').next().unwrap_or_default();
    if authority.is_empty() {
        return None;
    }

    let has_port = match authority.rfind(':') {
        Some(idx) => !authority[idx..].contains(']'),
        None => false,
    };
    if has_port {
        Some(authority.to_string())
    } else {
        Some(format!("{}:{}", authority, default_port))
    }
}

/// Signal source that derives reachability from TCP connects.
///
/// A CLI has no platform "online" event, so the probe periodically opens a
/// TCP connection to the remote endpoint and reports whether it succeeded.
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    target: String,
    interval: Duration,
    timeout: Duration,
}

impl ReachabilityProbe {
    /// Create a probe for `host:port`.
    pub fn new(target: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        ReachabilityProbe {
            target: target.into(),
            interval,
            timeout,
        }
    }

    /// Performs one reachability check.
    pub async fn check(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(self.target.as_str())).await,
            Ok(Ok(_))
        )
    }

    /// Feeds check results into `monitor` until `cancel` fires.
    pub fn spawn(self, monitor: ConnectivityMonitor, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                let online = self.check().await;
                tracing::trace!(addr = %self.target, online, "reachability probe");
                monitor.set_online(online);
            }
        })
    }
}
