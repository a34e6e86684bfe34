// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Split-log worker loop.

use crate::splitter::{SplitStatus, WalSplitter};
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use walsplit_coord::{
    CoordError, RecoverableClient, RetryBudget, Store, WatchEvent, WatchSender,
};
use walsplit_core::{
    decode_task_name, is_rescan_node, node_basename, ServerName, SplitConfig, TaskPayload,
    TaskState,
};

/// Worker-side activity counters.
#[derive(Debug, Default)]
pub struct WorkerCounters {
    pub tasks_claimed: AtomicU64,
    pub tasks_done: AtomicU64,
    pub tasks_errored: AtomicU64,
    pub tasks_resigned: AtomicU64,
    /// Claims lost mid-split: the manager took the task back or the node
    /// vanished before the result was published.
    pub preemptions: AtomicU64,
}

impl WorkerCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// One split-log worker. Processes at most one task at a time; racing with
/// peers happens only at claim time, never by reservation.
pub struct SplitLogWorker {
    client: RecoverableClient,
    server: ServerName,
    parent: String,
    config: SplitConfig,
    splitter: Arc<dyn WalSplitter>,
    stopper: CancellationToken,
    counters: Arc<WorkerCounters>,
}

impl SplitLogWorker {
    pub fn new(
        store: Arc<dyn Store>,
        base_path: &str,
        server: ServerName,
        splitter: Arc<dyn WalSplitter>,
        config: SplitConfig,
    ) -> Self {
        Self {
            client: RecoverableClient::new(store),
            server,
            parent: format!("{}/splitlog", base_path.trim_end_matches('/')),
            config,
            splitter,
            stopper: CancellationToken::new(),
            counters: Arc::new(WorkerCounters::default()),
        }
    }

    /// Token that stops the run loop; clone it before [`Self::spawn`].
    pub fn stopper(&self) -> CancellationToken {
        self.stopper.clone()
    }

    /// Shared counter handle; clone it before [`Self::spawn`].
    pub fn counters(&self) -> Arc<WorkerCounters> {
        self.counters.clone()
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until stopped or the coordination session expires.
    pub async fn run(self) {
        tracing::info!(server = %self.server, "split-log worker starting");
        let (watch_tx, mut watch_rx) = mpsc::unbounded_channel::<WatchEvent>();
        loop {
            if self.stopper.is_cancelled() || self.client.is_expired() {
                break;
            }
            for path in self.scan_tasks(watch_tx.clone()).await {
                if self.stopper.is_cancelled() {
                    break;
                }
                self.try_grab_and_run(&path).await;
            }
            if self.stopper.is_cancelled() || self.client.is_expired() {
                break;
            }
            tokio::select! {
                _ = self.stopper.cancelled() => break,
                ev = watch_rx.recv() => {
                    if ev.is_none() {
                        break;
                    }
                    // a rescan beacon or any child change lands here; drain
                    // the burst and re-list once
                    while watch_rx.try_recv().is_ok() {}
                }
                // fallback refresh for watches lost with a store session
                _ = tokio::time::sleep(self.refresh_period()) => {}
            }
        }
        tracing::info!(server = %self.server, "split-log worker stopped");
    }

    fn refresh_period(&self) -> Duration {
        self.config.report_period()
    }

    fn budget(&self) -> RetryBudget {
        RetryBudget::limited(self.config.zk_retries)
    }

    /// List current task nodes in randomized order, re-arming the children
    /// watch. Beacons are broadcast pings, not claimable work.
    async fn scan_tasks(&self, watch: WatchSender) -> Vec<String> {
        let children = match self.client.children(&self.parent, Some(watch), self.budget()).await
        {
            Ok(Some(kids)) => kids,
            Ok(None) => Vec::new(), // no splitting underway yet
            Err(e) => {
                tracing::warn!(error = %e, "failed to list split tasks");
                Vec::new()
            }
        };
        let mut paths: Vec<String> = children
            .into_iter()
            .filter(|child| !is_rescan_node(child))
            .map(|child| format!("{}/{}", self.parent, child))
            .collect();
        paths.shuffle(&mut rand::thread_rng());
        paths
    }

    /// Race for one task; on winning the CAS, run the split to a terminal
    /// state. Losing the race in any way is not an error.
    async fn try_grab_and_run(&self, path: &str) {
        let (data, version) = match self.client.get_data(path, None, self.budget()).await {
            Ok(v) => v,
            Err(CoordError::NoNode(_)) => return,
            Err(e) => {
                tracing::debug!(path, error = %e, "failed to read task, skipping");
                return;
            }
        };
        let payload = match TaskPayload::from_bytes(&data) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(path, error = %e, "skipping undecodable task");
                return;
            }
        };
        if payload.state != TaskState::Unassigned {
            return;
        }
        let owned = TaskPayload::owned(self.server.clone()).to_bytes();
        let claimed_version =
            match self.client.set_data_version(path, &owned, version, self.budget()).await {
                Ok(Some(v)) => v,
                Ok(None) => {
                    tracing::debug!(path, "lost the claim race");
                    return;
                }
                Err(e) => {
                    tracing::debug!(path, error = %e, "claim failed");
                    return;
                }
            };
        tracing::info!(path, server = %self.server, "claimed split task");
        WorkerCounters::bump(&self.counters.tasks_claimed);
        self.run_claimed(path, claimed_version).await;
    }

    async fn run_claimed(&self, path: &str, claimed_version: i64) {
        let task_name = decode_task_name(node_basename(path))
            .unwrap_or_else(|_| node_basename(path).to_string());

        let version = Arc::new(AtomicI64::new(claimed_version));
        let preempted = Arc::new(AtomicBool::new(false));
        let cancel = self.stopper.child_token();
        let heartbeat = tokio::spawn(heartbeat_loop(
            self.client.clone(),
            path.to_string(),
            self.server.clone(),
            self.config.report_period(),
            self.budget(),
            version.clone(),
            preempted.clone(),
            cancel.clone(),
        ));

        let status = tokio::select! {
            status = self.splitter.split(&task_name, &cancel) => status,
            _ = cancel.cancelled() => SplitStatus::Preempted,
        };

        cancel.cancel();
        let _ = heartbeat.await;

        if preempted.load(Ordering::SeqCst) || status == SplitStatus::Preempted {
            tracing::info!(path, "split preempted, leaving task alone");
            WorkerCounters::bump(&self.counters.preemptions);
            return;
        }

        let (final_payload, counter) = match status {
            SplitStatus::Done => {
                (TaskPayload::done(self.server.clone()), &self.counters.tasks_done)
            }
            SplitStatus::Err => {
                (TaskPayload::err(self.server.clone()), &self.counters.tasks_errored)
            }
            SplitStatus::Resigned => {
                (TaskPayload::resigned(self.server.clone()), &self.counters.tasks_resigned)
            }
            SplitStatus::Preempted => return,
        };
        let expected = version.load(Ordering::SeqCst);
        match self
            .client
            .set_data_version(path, &final_payload.to_bytes(), expected, self.budget())
            .await
        {
            Ok(Some(_)) => {
                tracing::info!(path, ?status, "split finished");
                WorkerCounters::bump(counter);
            }
            Ok(None) => {
                tracing::info!(path, "task was taken back before the result was published");
                WorkerCounters::bump(&self.counters.preemptions);
            }
            Err(CoordError::NoNode(_)) => {
                tracing::info!(path, "task node vanished before the result was published");
            }
            Err(e) => tracing::warn!(path, error = %e, "failed to publish split result"),
        }
    }
}

/// Refresh ownership on a cadence by CAS-ing the node back to
/// `OWNED(self)`, advancing its version. A failed CAS means the manager
/// resubmitted the task: flag preemption and cancel the split.
#[allow(clippy::too_many_arguments)]
async fn heartbeat_loop(
    client: RecoverableClient,
    path: String,
    server: ServerName,
    period: Duration,
    budget: RetryBudget,
    version: Arc<AtomicI64>,
    preempted: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    let payload = TaskPayload::owned(server).to_bytes();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(period) => {}
        }
        let expected = version.load(Ordering::SeqCst);
        match client.set_data_version(&path, &payload, expected, budget).await {
            Ok(Some(v)) => {
                version.store(v, Ordering::SeqCst);
                tracing::debug!(path, version = v, "task heartbeat");
            }
            Ok(None) => {
                tracing::info!(path, "task reassigned by the manager, aborting split");
                preempted.store(true, Ordering::SeqCst);
                cancel.cancel();
                return;
            }
            Err(CoordError::NoNode(_)) => {
                tracing::info!(path, "task node gone, aborting split");
                preempted.store(true, Ordering::SeqCst);
                cancel.cancel();
                return;
            }
            // transient; the next period tries again
            Err(e) => tracing::warn!(path, error = %e, "task heartbeat failed"),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
