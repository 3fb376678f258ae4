// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync commands: one-shot drain, manual retry, continuous watch, status.

use std::sync::Arc;

use ob_core::{EntryQueue, JsonlQueue, PendingEntry, ServerRecord};
use tokio_util::sync::CancellationToken;

use super::Context;
use crate::cli::OutputFormat;
use crate::config::RemoteConfig;
use crate::display::{format_report, format_status, format_status_json};
use crate::error::{Error, Result};
use crate::sync::{
    probe_target, AttemptOutcome, ConnectivityMonitor, ReachabilityProbe, SyncCoordinator,
    SyncLock, SyncObserver, SyncOutcome, SyncStatus, WebSocketSubmitter,
};

type Coordinator = SyncCoordinator<JsonlQueue, WebSocketSubmitter>;

/// Prints per-entry sync results as they happen.
struct ConsoleObserver;

impl SyncObserver for ConsoleObserver {
    fn on_sync_success(&self, record: &ServerRecord) {
        println!("synced as {}", record.id);
    }

    fn on_sync_error(&self, message: &str, entry: &PendingEntry) {
        println!("needs attention: {} ({})", entry.id, message);
        println!("  hint: 'outbox retry {}' or 'outbox remove {}'", entry.id, entry.id);
    }

    fn on_attempt_failed(&self, message: &str, entry: &PendingEntry) {
        println!(
            "failed: {} (attempt {}): {}",
            entry.id, entry.attempts, message
        );
    }
}

fn probe_for(ctx: &Context, remote: &RemoteConfig) -> Option<ReachabilityProbe> {
    probe_target(&remote.url).map(|target| {
        ReachabilityProbe::new(
            target,
            ctx.config.sync.probe_interval(),
            ctx.config.sync.probe_timeout(),
        )
    })
}

/// Probe once. Without a resolvable target the remote is assumed reachable
/// and the submission itself will report the failure.
async fn reachable(probe: Option<&ReachabilityProbe>) -> bool {
    match probe {
        Some(probe) => probe.check().await,
        None => true,
    }
}

fn coordinator(ctx: &Context, remote: &RemoteConfig, monitor: ConnectivityMonitor) -> Coordinator {
    let submitter = WebSocketSubmitter::new(remote.url.clone(), remote.submit_timeout());
    SyncCoordinator::new(
        Arc::clone(&ctx.queue),
        Arc::new(submitter),
        monitor,
        ctx.config.sync.to_sync_config(),
    )
    .with_observer(Arc::new(ConsoleObserver))
    .with_sync_lock(SyncLock::new(ctx.state_dir.join("sync.lock")))
}

/// Run one drain pass and print the report.
pub fn run(ctx: &Context) -> Result<()> {
    let remote = ctx.config.remote()?;
    let probe = probe_for(ctx, remote);

    let outcome = ctx.block_on(async {
        let monitor = ConnectivityMonitor::new(reachable(probe.as_ref()).await);
        coordinator(ctx, remote, monitor).sync_now().await
    })?;

    match outcome {
        SyncOutcome::Offline => {
            println!("Remote unreachable: {}", remote.url);
            println!("Entries stay queued until it is back.");
        }
        SyncOutcome::Empty => println!("Nothing to sync"),
        SyncOutcome::Busy => println!("Sync already running"),
        SyncOutcome::Completed(report) => println!("{}", format_report(&report)),
    }
    Ok(())
}

/// Reset one entry's retries and submit it once.
pub fn retry(ctx: &Context, id: &str) -> Result<()> {
    let remote = ctx.config.remote()?;
    let monitor = ConnectivityMonitor::new(true);
    let outcome = ctx.block_on(coordinator(ctx, remote, monitor).retry_entry(id))?;

    match outcome {
        AttemptOutcome::Succeeded(_) => Ok(()),
        AttemptOutcome::Failed { message } | AttemptOutcome::Exhausted { message } => {
            Err(Error::SubmitFailed(message))
        }
        AttemptOutcome::Discarded => {
            println!("Entry {} was removed during the retry", id);
            Ok(())
        }
        AttemptOutcome::Skipped => {
            println!("Entry {} reached the retry limit again before it was sent", id);
            Ok(())
        }
    }
}

/// Drain continuously, driven by reachability, until Ctrl-C.
pub fn watch(ctx: &Context) -> Result<()> {
    let remote = ctx.config.remote()?;
    let probe = probe_for(ctx, remote);

    ctx.block_on(async {
        let monitor = ConnectivityMonitor::new(reachable(probe.as_ref()).await);
        let _log_transitions = monitor.subscribe(|online| {
            if online {
                tracing::info!("remote reachable");
            } else {
                tracing::warn!("remote unreachable, queueing");
            }
        });
        let coordinator = Arc::new(coordinator(ctx, remote, monitor.clone()));
        let cancel = CancellationToken::new();

        let probe_task = probe.map(|p| p.spawn(monitor.clone(), cancel.clone()));
        let sync_task = tokio::spawn(Arc::clone(&coordinator).run(cancel.clone()));

        println!("Watching {} (Ctrl-C to stop)", remote.url);
        tokio::signal::ctrl_c().await?;
        tracing::info!("interrupted, finishing in-flight work");
        cancel.cancel();

        if let Some(task) = probe_task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "reachability probe ended abnormally");
            }
        }
        sync_task
            .await
            .map_err(|e| Error::Runtime(format!("sync loop failed: {}", e)))?;

        let pending = coordinator.pending_count().await?;
        println!("Stopped with {} pending", pending);
        Ok::<(), Error>(())
    })
}

/// Print queue counts and remote reachability.
pub fn status(ctx: &Context, output: OutputFormat) -> Result<()> {
    let remote = ctx.config.remote.as_ref();
    let probe = remote.and_then(|r| probe_for(ctx, r));
    let max_attempts = ctx.max_attempts();

    let status = ctx.block_on(async {
        let entries = ctx.queue.list().await?;
        let online = match remote {
            Some(_) => reachable(probe.as_ref()).await,
            None => false,
        };
        Ok::<_, Error>(SyncStatus {
            online,
            syncing: false,
            pending: entries.len(),
            needs_attention: entries
                .iter()
                .filter(|e| !e.is_eligible(max_attempts))
                .count(),
        })
    })?;

    let url = ctx.config.remote_url();
    match output {
        OutputFormat::Text => {
            for line in format_status(&status, url) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", format_status_json(&status, url)?),
    }
    Ok(())
}
