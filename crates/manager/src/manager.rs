// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Split-log manager.
//!
//! One manager runs on the master. `split_distributed` publishes one task
//! node per WAL file and resolves once every task in the batch is terminal.
//! Workers race to own the nodes; the manager interprets every data change
//! through its watch channel, resubmits stalled or abandoned tasks, runs the
//! finisher on completed ones, and deletes finished nodes.
//!
//! All coordination I/O is asynchronous: each op runs on a spawned task and
//! its continuation is the callback. No caller thread ever blocks inside the
//! manager waiting for the store.

use crate::cluster::ClusterView;
use crate::counters::Counters;
use crate::error::ManagerError;
use crate::finisher::{FinishStatus, TaskFinisher};
use crate::task::{Batch, ResubmitDirective, ResubmitOutcome, Task, TerminationStatus};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use walsplit_coord::{
    CoordError, CreateMode, RecoverableClient, RetryBudget, Store, WatchEvent, WatchKind,
    WatchSender,
};
use walsplit_core::{
    decode_task_name, is_rescan_node, node_basename, task_node_path, Clock, ServerName,
    SplitConfig, SystemClock, TaskPayload, TaskState, RESCAN_PREFIX,
};

/// Version delivered for a node that no longer exists. Whoever removed it
/// considered the task done.
pub(crate) const VANISHED_VERSION: i64 = i64::MIN;

/// External collaborators of the manager.
pub struct ManagerDeps {
    pub store: Arc<dyn Store>,
    /// Base path in the coordination store; tasks live under
    /// `<base>/splitlog`.
    pub base_path: String,
    /// This master's identity, written into `UNASSIGNED` payloads.
    pub server: ServerName,
    pub finisher: Arc<dyn TaskFinisher>,
    pub cluster: Arc<dyn ClusterView>,
}

/// Master-side coordinator for distributed WAL splitting.
pub struct SplitLogManager<C: Clock = SystemClock> {
    inner: Arc<Inner<C>>,
}

impl SplitLogManager<SystemClock> {
    pub fn new(deps: ManagerDeps, config: SplitConfig) -> Self {
        Self::with_clock(deps, config, SystemClock)
    }
}

impl<C: Clock> SplitLogManager<C> {
    pub fn with_clock(deps: ManagerDeps, config: SplitConfig, clock: C) -> Self {
        let (watch_tx, watch_rx) = mpsc::unbounded_channel();
        let parent = format!("{}/splitlog", deps.base_path.trim_end_matches('/'));
        let inner = Arc::new_cyclic(|me| Inner {
            me: me.clone(),
            client: RecoverableClient::new(deps.store),
            config,
            server: deps.server,
            parent,
            tasks: Mutex::new(HashMap::new()),
            dead_workers: Mutex::new(HashSet::new()),
            failed_deletions: Mutex::new(HashSet::new()),
            // i64::MAX keeps the rescan clock quiet until a node is created
            last_node_create_ms: AtomicI64::new(i64::MAX),
            finisher: deps.finisher,
            cluster: deps.cluster,
            counters: Counters::default(),
            stopper: CancellationToken::new(),
            watch_tx,
            watch_rx: Mutex::new(Some(watch_rx)),
            clock,
        });
        Self { inner }
    }

    /// Start the watch dispatcher and timeout monitor, then scan the task
    /// parent for orphan nodes left by a previous master incarnation. The
    /// monitor is skipped in recovery-only mode.
    pub async fn finish_initialization(&self, master_recovery: bool) -> Result<(), ManagerError> {
        let inner = &self.inner;
        inner.client.ensure_path(&inner.parent, inner.zk_budget()).await?;

        if let Some(rx) = inner.watch_rx.lock().take() {
            spawn_dispatcher(inner.clone(), rx);
        }
        if !master_recovery {
            crate::monitor::spawn(inner.clone());
        }

        let orphans = inner
            .client
            .children(&inner.parent, None, inner.zk_budget())
            .await?
            .unwrap_or_default();
        if !orphans.is_empty() {
            tracing::info!(count = orphans.len(), "found orphan tasks from a previous master");
        }
        for child in orphans {
            let path = format!("{}/{}", inner.parent, child);
            inner.find_or_create_orphan_task(&path);
            inner.get_data_and_watch(path);
        }
        Ok(())
    }

    /// Split every WAL file under the given directories across the worker
    /// fleet. Resolves with the total bytes of the enqueued files once every
    /// task succeeded; fails if any task ends in error or the manager is
    /// stopped while waiting. Never returns a partial success.
    pub async fn split_distributed(&self, log_dirs: &[PathBuf]) -> Result<u64, ManagerError> {
        let inner = &self.inner;
        tracing::info!(dirs = ?log_dirs, "started splitting wal directories");
        let logs = enumerate_log_files(log_dirs)?;
        let total_bytes: u64 = logs.iter().map(|l| l.size).sum();
        let batch = Batch::new();

        let outcome = async {
            for log in &logs {
                inner.enqueue(&log.name, &batch).await?;
            }
            inner.wait_for_batch(&batch).await?;
            let counts = batch.counts();
            if counts.error > 0 {
                return Err(ManagerError::BatchFailed {
                    installed: counts.installed,
                    done: counts.done,
                    error: counts.error,
                });
            }
            Ok(())
        }
        .await;
        if let Err(e) = outcome {
            // surviving tasks become orphans a later call may adopt
            batch.mark_dead();
            return Err(e);
        }

        // best-effort source cleanup; the recovered edits are what matter
        for dir in log_dirs {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to remove split wal directory");
            }
        }
        let counts = batch.counts();
        tracing::info!(files = counts.installed, bytes = total_bytes, "finished splitting wal directories");
        Ok(total_bytes)
    }

    /// Single-directory convenience for [`Self::split_distributed`].
    pub async fn split_dir(&self, log_dir: &Path) -> Result<u64, ManagerError> {
        self.split_distributed(std::slice::from_ref(&log_dir.to_path_buf())).await
    }

    /// Record a worker death reported by the membership service. The next
    /// monitor tick force-resubmits its tasks.
    pub fn handle_dead_worker(&self, worker: ServerName) {
        tracing::debug!(worker = %worker, "worker reported dead");
        self.inner.dead_workers.lock().insert(worker);
    }

    pub fn handle_dead_workers(&self, workers: impl IntoIterator<Item = ServerName>) {
        let mut dead = self.inner.dead_workers.lock();
        for worker in workers {
            tracing::debug!(worker = %worker, "worker reported dead");
            dead.insert(worker);
        }
    }

    /// Stop the monitor and release batch waiters. Safe to call repeatedly.
    pub fn stop(&self) {
        self.inner.stopper.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopper.is_cancelled()
    }

    pub fn counters(&self) -> &Counters {
        &self.inner.counters
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Arc<Inner<C>> {
        &self.inner
    }
}

/// Shared manager state. Async continuations hold an `Arc` of this.
pub(crate) struct Inner<C: Clock> {
    me: Weak<Inner<C>>,
    pub(crate) client: RecoverableClient,
    pub(crate) config: SplitConfig,
    pub(crate) server: ServerName,
    pub(crate) parent: String,
    pub(crate) tasks: Mutex<HashMap<String, Arc<Task>>>,
    pub(crate) dead_workers: Mutex<HashSet<ServerName>>,
    pub(crate) failed_deletions: Mutex<HashSet<String>>,
    pub(crate) last_node_create_ms: AtomicI64,
    finisher: Arc<dyn TaskFinisher>,
    pub(crate) cluster: Arc<dyn ClusterView>,
    pub(crate) counters: Counters,
    pub(crate) stopper: CancellationToken,
    pub(crate) watch_tx: WatchSender,
    watch_rx: Mutex<Option<mpsc::UnboundedReceiver<WatchEvent>>>,
    pub(crate) clock: C,
}

fn spawn_dispatcher<C: Clock>(
    inner: Arc<Inner<C>>,
    mut rx: mpsc::UnboundedReceiver<WatchEvent>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = inner.stopper.cancelled() => break,
                ev = rx.recv() => match ev {
                    Some(ev) => inner.handle_watch_event(ev).await,
                    None => break,
                },
            }
        }
    });
}

impl<C: Clock> Inner<C> {
    pub(crate) fn zk_budget(&self) -> RetryBudget {
        RetryBudget::limited(self.config.zk_retries)
    }

    fn task(&self, path: &str) -> Option<Arc<Task>> {
        self.tasks.lock().get(path).cloned()
    }

    /// Task object for a node this manager did not enqueue itself (previous
    /// master incarnation, or a rescan beacon).
    pub(crate) fn find_or_create_orphan_task(&self, path: &str) -> Arc<Task> {
        let mut tasks = self.tasks.lock();
        if let Some(task) = tasks.get(path) {
            return task.clone();
        }
        tracing::info!(path, "creating orphan task");
        Counters::bump(&self.counters.orphans_adopted);
        let task = Task::new(path, None);
        tasks.insert(path.to_string(), task.clone());
        task
    }

    /// Install a task for `name` into `batch` and publish its node.
    ///
    /// If a task already exists at that path, the five duplicate sub-cases
    /// apply: a non-orphan is a scheduling conflict; a succeeded orphan is a
    /// no-op; an in-progress orphan is adopted; a failed orphan is waited
    /// out until its node deletion and the slot reclaimed.
    pub(crate) async fn enqueue(&self, name: &str, batch: &Arc<Batch>) -> Result<(), ManagerError> {
        let path = task_node_path(&self.parent, name);
        let mut waited = false;
        loop {
            enum Slot {
                Created,
                Existing(Arc<Task>),
            }
            let slot = {
                let mut tasks = self.tasks.lock();
                match tasks.entry(path.clone()) {
                    Entry::Vacant(entry) => {
                        // insert before the async create so late watcher
                        // events always find a task object
                        entry.insert(Task::new(path.as_str(), Some(batch.clone())));
                        Slot::Created
                    }
                    Entry::Occupied(entry) => Slot::Existing(entry.get().clone()),
                }
            };
            let existing = match slot {
                Slot::Created => {
                    batch.install();
                    Counters::bump(&self.counters.tasks_created);
                    self.create_node(path);
                    return Ok(());
                }
                Slot::Existing(task) => task,
            };

            enum Next {
                Refuse,
                AlreadyDone,
                Adopted,
                WaitDeleted,
                Reclaim,
            }
            let next = {
                let mut data = existing.data.lock();
                if !data.is_orphan() {
                    Next::Refuse
                } else {
                    match data.status {
                        // setDone already ran for it; install nothing
                        TerminationStatus::Success => Next::AlreadyDone,
                        TerminationStatus::InProgress => {
                            // install under the task lock so a completion
                            // racing in can never see done > installed
                            data.batch = Some(batch.clone());
                            batch.install();
                            Next::Adopted
                        }
                        TerminationStatus::Failure => Next::WaitDeleted,
                        TerminationStatus::Deleted => Next::Reclaim,
                    }
                }
            };
            match next {
                Next::Refuse => return Err(ManagerError::DuplicateTask(name.to_string())),
                Next::AlreadyDone => return Ok(()),
                Next::Adopted => {
                    tracing::info!(path, "adopted orphan task");
                    return Ok(());
                }
                Next::Reclaim => {
                    // delete callback fired but the entry lingered; drop it
                    let mut tasks = self.tasks.lock();
                    if let Some(current) = tasks.get(&path) {
                        if Arc::ptr_eq(current, &existing) {
                            tasks.remove(&path);
                        }
                    }
                }
                Next::WaitDeleted => {
                    if waited {
                        return Err(ManagerError::StaleTask(name.to_string()));
                    }
                    waited = true;
                    // the failed orphan's node is being deleted; wait for the
                    // callback, then install a fresh task in its place
                    let notified = existing.deleted.notified();
                    let already_deleted =
                        existing.data.lock().status == TerminationStatus::Deleted;
                    if !already_deleted {
                        tokio::select! {
                            _ = notified => {}
                            _ = self.stopper.cancelled() => return Err(ManagerError::Interrupted),
                        }
                    }
                }
            }
        }
    }

    pub(crate) async fn wait_for_batch(&self, batch: &Arc<Batch>) -> Result<(), ManagerError> {
        loop {
            let changed = batch.changed();
            if batch.is_complete() {
                return Ok(());
            }
            tokio::select! {
                _ = changed => {}
                _ = self.stopper.cancelled() => return Err(ManagerError::Interrupted),
            }
        }
    }

    async fn handle_watch_event(&self, ev: WatchEvent) {
        match ev.kind {
            WatchKind::DataChanged | WatchKind::NodeCreated => self.get_data_and_watch(ev.path),
            WatchKind::NodeDeleted => self.data_arrived(&ev.path, None, VANISHED_VERSION).await,
            WatchKind::ChildrenChanged => {}
        }
    }

    /// Async-create a task node in `UNASSIGNED` state.
    fn create_node(&self, path: String) {
        let Some(inner) = self.me.upgrade() else { return };
        tokio::spawn(async move {
            let payload = TaskPayload::unassigned(inner.server.clone()).to_bytes();
            match inner
                .client
                .create_ignore_exists(&path, &payload, CreateMode::Persistent, inner.zk_budget())
                .await
            {
                Ok(_) => inner.create_node_success(path),
                Err(e) => {
                    tracing::warn!(path, error = %e, "failed to create task node");
                    inner.set_done(&path, TerminationStatus::Failure);
                }
            }
        });
    }

    fn create_node_success(&self, path: String) {
        let now = self.clock.now_ms();
        self.last_node_create_ms.store(now, Ordering::SeqCst);
        if let Some(task) = self.task(&path) {
            task.data.lock().last_update_ms = now;
        }
        self.get_data_and_watch(path);
    }

    /// Async-read a task node and re-arm its data watch.
    pub(crate) fn get_data_and_watch(&self, path: String) {
        let Some(inner) = self.me.upgrade() else { return };
        tokio::spawn(async move {
            let watch = inner.watch_tx.clone();
            match inner.client.get_data(&path, Some(watch), inner.zk_budget()).await {
                Ok((data, version)) => inner.data_arrived(&path, Some(data), version).await,
                Err(CoordError::NoNode(_)) => {
                    inner.data_arrived(&path, None, VANISHED_VERSION).await
                }
                Err(e) => {
                    tracing::warn!(path, error = %e, "failed to read task node");
                    inner.set_done(&path, TerminationStatus::Failure);
                }
            }
        });
    }

    /// Interpret delivered node data. `None` data with the vanished-version
    /// sentinel means the node is gone; `None` with a real version is a
    /// logic error.
    pub(crate) async fn data_arrived(&self, path: &str, data: Option<Vec<u8>>, version: i64) {
        let Some(data) = data else {
            if version == VANISHED_VERSION {
                tracing::info!(path, "task node vanished, assuming done");
                self.set_done(path, TerminationStatus::Success);
            } else {
                tracing::error!(path, version, "task node delivered no data");
                self.set_done(path, TerminationStatus::Failure);
            }
            return;
        };
        let payload = match TaskPayload::from_bytes(&data) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(path, error = %e, "undecodable task payload");
                self.set_done(path, TerminationStatus::Failure);
                return;
            }
        };
        if payload.state != TaskState::Owned {
            // unassigned and terminal writes advance the node version too; a
            // CAS resubmit must target the version that triggered this
            // delivery, not the last heartbeat snapshot
            self.observe_version(path, version);
        }
        match payload.state {
            TaskState::Unassigned => self.handle_unassigned(path).await,
            TaskState::Owned => self.heartbeat(path, version, payload.writer),
            TaskState::Resigned => {
                tracing::info!(path, worker = %payload.writer, "task resigned by worker");
                self.resubmit_or_fail(path, ResubmitDirective::Force).await;
            }
            TaskState::Done => self.handle_done(path, &payload.writer).await,
            TaskState::Err => {
                tracing::info!(path, worker = %payload.writer, "task reported error");
                // an errored task only ever retries; when the gates defer it
                // here the timeout monitor picks it up later
                let task = self.find_or_create_orphan_task(path);
                self.resubmit(path, &task, ResubmitDirective::Check).await;
            }
        }
    }

    /// Record the node version a delivery was observed at.
    fn observe_version(&self, path: &str, version: i64) {
        if let Some(task) = self.task(path) {
            task.data.lock().last_version = version;
        }
    }

    async fn handle_unassigned(&self, path: &str) {
        if is_rescan_node(path) {
            return;
        }
        let task = self.find_or_create_orphan_task(path);
        let kick = {
            let data = task.data.lock();
            data.is_orphan() && data.incarnation == 0
        };
        if kick {
            tracing::info!(path, "resubmitting unassigned orphan task");
            // failure is fine here; the timeout monitor retries later
            self.resubmit(path, &task, ResubmitDirective::Force).await;
        }
    }

    async fn handle_done(&self, path: &str, worker: &ServerName) {
        if is_rescan_node(path) {
            self.set_done(path, TerminationStatus::Success);
            return;
        }
        tracing::info!(path, worker = %worker, "task reported done");
        let task_name = decode_task_name(node_basename(path))
            .unwrap_or_else(|_| node_basename(path).to_string());
        match self.finisher.finish(worker, &task_name).await {
            FinishStatus::Done => self.set_done(path, TerminationStatus::Success),
            FinishStatus::Err => {
                tracing::warn!(path, "finisher failed, resubmitting");
                self.resubmit_or_fail(path, ResubmitDirective::Check).await;
            }
        }
    }

    /// Record a worker heartbeat: any version advance on an owned node.
    fn heartbeat(&self, path: &str, version: i64, worker: ServerName) {
        let task = self.find_or_create_orphan_task(path);
        let mut data = task.data.lock();
        if data.last_version == version {
            // duplicate delivery: liveness probes re-read nodes without
            // advancing the version
            return;
        }
        if data.is_unassigned() {
            tracing::info!(path, worker = %worker, "task acquired");
        }
        data.heartbeat(self.clock.now_ms(), version, worker);
        Counters::bump(&self.counters.heartbeats);
    }

    /// Resubmit, escalating a genuine skip to terminal failure. Used on the
    /// paths where giving up is the sanctioned outcome (a finisher error, a
    /// resignation); a node that vanished first is already done and must not
    /// be failed on top.
    pub(crate) async fn resubmit_or_fail(&self, path: &str, directive: ResubmitDirective) {
        let task = self.find_or_create_orphan_task(path);
        match self.resubmit(path, &task, directive).await {
            ResubmitOutcome::Resubmitted | ResubmitOutcome::Finished => {}
            ResubmitOutcome::Skipped => self.set_done(path, TerminationStatus::Failure),
        }
    }

    /// Put a task back up for grabs by CAS-ing its node to `UNASSIGNED`.
    ///
    /// `Check` holds off while the worker is alive inside its timeout window
    /// and stops for good once the unforced threshold is reached; `Force`
    /// bypasses both and writes unconditionally.
    pub(crate) async fn resubmit(
        &self,
        path: &str,
        task: &Arc<Task>,
        directive: ResubmitDirective,
    ) -> ResubmitOutcome {
        let expected = {
            let mut data = task.data.lock();
            if data.status != TerminationStatus::InProgress {
                return ResubmitOutcome::Skipped;
            }
            match directive {
                ResubmitDirective::Force => -1,
                ResubmitDirective::Check => {
                    if let Some(worker) = &data.cur_worker {
                        let elapsed = self.clock.now_ms().saturating_sub(data.last_update_ms);
                        if self.cluster.is_alive(worker)
                            && elapsed < self.config.manager_timeout_ms as i64
                        {
                            return ResubmitOutcome::Skipped;
                        }
                    }
                    if data.unforced_resubmits >= self.config.max_resubmit {
                        if !data.threshold_reached {
                            data.threshold_reached = true;
                            Counters::bump(&self.counters.threshold_reached);
                            tracing::info!(
                                path,
                                threshold = self.config.max_resubmit,
                                "resubmit threshold reached, leaving task alone"
                            );
                        }
                        return ResubmitOutcome::Skipped;
                    }
                    data.last_version
                }
            }
        };

        let payload = TaskPayload::unassigned(self.server.clone()).to_bytes();
        match self.client.set_data_version(path, &payload, expected, self.zk_budget()).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::debug!(path, "resubmit lost the version race");
                return ResubmitOutcome::Skipped;
            }
            Err(CoordError::NoNode(_)) => {
                tracing::warn!(path, "task node gone before resubmit, assuming done elsewhere");
                self.set_done(path, TerminationStatus::Success);
                return ResubmitOutcome::Finished;
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to resubmit task");
                return ResubmitOutcome::Skipped;
            }
        }

        {
            let mut data = task.data.lock();
            if directive == ResubmitDirective::Check {
                data.unforced_resubmits += 1;
            }
            data.reset_for_resubmit();
        }
        Counters::bump(&self.counters.resubmits);
        tracing::info!(path, ?directive, "task resubmitted");
        self.create_rescan_node();
        ResubmitOutcome::Resubmitted
    }

    /// Idempotent terminal transition. Reports to the task's batch exactly
    /// once, then async-deletes the node either way.
    pub(crate) fn set_done(&self, path: &str, status: TerminationStatus) {
        match self.task(path) {
            None => {
                if !is_rescan_node(path) {
                    tracing::debug!(path, "done for task without in-memory state");
                }
            }
            Some(task) => {
                let report = {
                    let mut data = task.data.lock();
                    if data.status == TerminationStatus::InProgress {
                        data.status = status;
                        if !is_rescan_node(path) {
                            if status == TerminationStatus::Success {
                                Counters::bump(&self.counters.tasks_succeeded);
                                tracing::info!(path, "done splitting");
                            } else {
                                Counters::bump(&self.counters.tasks_failed);
                                tracing::warn!(path, "error splitting");
                            }
                        }
                        data.batch.clone()
                    } else {
                        None
                    }
                };
                if let Some(batch) = report {
                    batch.task_done(status == TerminationStatus::Success);
                }
            }
        }
        self.delete_node(path.to_string());
    }

    /// Async-delete a finished node. Failures land in the failed-deletions
    /// set the monitor drains.
    pub(crate) fn delete_node(&self, path: String) {
        let Some(inner) = self.me.upgrade() else { return };
        tokio::spawn(async move {
            match inner.client.delete_ignore_missing(&path, inner.zk_budget()).await {
                Ok(()) => inner.delete_node_success(&path),
                Err(e) => {
                    tracing::warn!(path, error = %e, "failed to delete task node, will retry");
                    inner.delete_node_failure(path);
                }
            }
        });
    }

    fn delete_node_success(&self, path: &str) {
        Counters::bump(&self.counters.nodes_deleted);
        let Some(task) = self.tasks.lock().remove(path) else {
            tracing::debug!(path, "deleted node without in-memory state");
            return;
        };
        task.data.lock().status = TerminationStatus::Deleted;
        task.deleted.notify_waiters();
    }

    fn delete_node_failure(&self, path: String) {
        Counters::bump(&self.counters.delete_failures);
        self.failed_deletions.lock().insert(path);
    }

    /// Async-create a rescan beacon: a sequential `DONE` node whose
    /// appearance makes workers re-scan the task list.
    pub(crate) fn create_rescan_node(&self) {
        let Some(inner) = self.me.upgrade() else { return };
        tokio::spawn(async move {
            let payload = TaskPayload::done(inner.server.clone()).to_bytes();
            match inner
                .client
                .create_sequential(&inner.parent, RESCAN_PREFIX, &payload, inner.zk_budget())
                .await
            {
                Ok(path) => {
                    Counters::bump(&inner.counters.rescans_created);
                    inner.last_node_create_ms.store(inner.clock.now_ms(), Ordering::SeqCst);
                    // its DONE payload routes it straight to deletion
                    inner.get_data_and_watch(path);
                }
                Err(e) => tracing::warn!(error = %e, "failed to create rescan beacon"),
            }
        });
    }
}

struct LogFile {
    name: String,
    size: u64,
}

/// Regular files under the given directories. A missing directory is
/// skipped, not an error; a master may race another master's cleanup.
fn enumerate_log_files(dirs: &[PathBuf]) -> io::Result<Vec<LogFile>> {
    let mut logs = Vec::new();
    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "wal directory does not exist, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };
        for entry in entries {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            logs.push(LogFile {
                name: entry.path().to_string_lossy().into_owned(),
                size: meta.len(),
            });
        }
    }
    Ok(logs)
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
