// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and batch bookkeeping.
//!
//! A `Task` is the manager's in-memory shadow of one task node; all of its
//! mutable state sits behind its own lock, and status transitions are
//! linearized by that lock. A `Batch` is the set of tasks installed by one
//! `split_distributed` call; its submitter sleeps on the batch until
//! `done + error == installed`.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use walsplit_core::ServerName;

/// Sentinel for "no version/timestamp observed yet".
pub(crate) const UNSET: i64 = -1;

/// Terminal bookkeeping status of a task object.
///
/// Transitions are monotonic, except that `Failure → Deleted` is allowed
/// once the node is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    InProgress,
    Success,
    Failure,
    Deleted,
}

/// How hard a resubmit tries.
///
/// `Check` enforces worker liveness, the heartbeat timeout, and the
/// unforced-resubmit threshold; `Force` bypasses all three and does not
/// count against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResubmitDirective {
    Check,
    Force,
}

/// What a resubmit attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResubmitOutcome {
    /// The node is back in `UNASSIGNED` under a new incarnation.
    Resubmitted,
    /// A gate or the CAS said no; the task is still live as it was.
    Skipped,
    /// The node vanished first; the task was marked done instead.
    Finished,
}

/// Counters of one submission batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchCounts {
    pub installed: usize,
    pub done: usize,
    pub error: usize,
}

/// The set of tasks installed by a single `split_distributed` call.
#[derive(Debug)]
pub struct Batch {
    counts: Mutex<BatchCounts>,
    dead: AtomicBool,
    notify: Notify,
}

impl Batch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { counts: Mutex::new(BatchCounts::default()), dead: AtomicBool::new(false), notify: Notify::new() })
    }

    pub fn counts(&self) -> BatchCounts {
        *self.counts.lock()
    }

    /// A dead batch no longer owns its tasks; they become orphans.
    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_dead(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }

    pub(crate) fn install(&self) {
        self.counts.lock().installed += 1;
    }

    pub(crate) fn task_done(&self, success: bool) {
        {
            let mut counts = self.counts.lock();
            if success {
                counts.done += 1;
            } else {
                counts.error += 1;
            }
        }
        self.notify.notify_waiters();
    }

    pub(crate) fn is_complete(&self) -> bool {
        let counts = self.counts.lock();
        counts.done + counts.error >= counts.installed
    }

    /// Future that resolves on the next counter change. Create it before
    /// re-checking `is_complete` so no notification is lost.
    pub(crate) fn changed(&self) -> Notified<'_> {
        self.notify.notified()
    }
}

/// Mutable task state, guarded by the task's lock.
#[derive(Debug)]
pub(crate) struct TaskData {
    /// Epoch ms of the last observed activity; [`UNSET`] right after a
    /// resubmit reset.
    pub last_update_ms: i64,
    /// Last node version this manager observed; [`UNSET`] until first read.
    pub last_version: i64,
    /// `None` iff the task is unassigned.
    pub cur_worker: Option<ServerName>,
    pub batch: Option<Arc<Batch>>,
    pub status: TerminationStatus,
    /// Bumped on every successful resubmit.
    pub incarnation: u32,
    /// CHECK resubmits so far; FORCE does not count.
    pub unforced_resubmits: u32,
    pub threshold_reached: bool,
}

impl TaskData {
    /// A task is an orphan when no live batch owns it.
    pub fn is_orphan(&self) -> bool {
        match &self.batch {
            None => true,
            Some(batch) => batch.is_dead(),
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.cur_worker.is_none()
    }

    /// Record a worker heartbeat observed at `now_ms` with a new version.
    pub fn heartbeat(&mut self, now_ms: i64, version: i64, worker: ServerName) {
        self.last_update_ms = now_ms;
        self.last_version = version;
        self.cur_worker = Some(worker);
    }

    /// Reset after a successful resubmit: back to unassigned, next
    /// incarnation.
    pub fn reset_for_resubmit(&mut self) {
        self.incarnation += 1;
        self.cur_worker = None;
        self.last_update_ms = UNSET;
    }
}

/// One task: the unit of work of splitting a single WAL file.
pub(crate) struct Task {
    pub path: String,
    pub data: Mutex<TaskData>,
    /// Notified when the node delete callback transitions us to `Deleted`;
    /// enqueue waits on this to reclaim the slot of a failed orphan.
    pub deleted: Notify,
}

impl Task {
    pub fn new(path: impl Into<String>, batch: Option<Arc<Batch>>) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            data: Mutex::new(TaskData {
                last_update_ms: UNSET,
                last_version: UNSET,
                cur_worker: None,
                batch,
                status: TerminationStatus::InProgress,
                incarnation: 0,
                unforced_resubmits: 0,
                threshold_reached: false,
            }),
            deleted: Notify::new(),
        })
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
