// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process accounting for manager activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Activity counters kept on the manager. In-process accounting only; an
/// embedding process exports them however it likes.
#[derive(Debug, Default)]
pub struct Counters {
    /// Task nodes created by enqueue.
    pub tasks_created: AtomicU64,
    /// Task objects created for nodes discovered without a batch.
    pub orphans_adopted: AtomicU64,
    /// Owned-state observations that advanced a task's version.
    pub heartbeats: AtomicU64,
    /// Successful resubmits, forced or not.
    pub resubmits: AtomicU64,
    /// Resubmits attempted because the owning worker died.
    pub dead_worker_resubmits: AtomicU64,
    /// Tasks that hit the unforced-resubmit threshold (bumped once each).
    pub threshold_reached: AtomicU64,
    /// Rescan beacons created.
    pub rescans_created: AtomicU64,
    /// Unassigned-task rebroadcast rounds run by the monitor.
    pub unassigned_rebroadcasts: AtomicU64,
    pub tasks_succeeded: AtomicU64,
    pub tasks_failed: AtomicU64,
    pub nodes_deleted: AtomicU64,
    pub delete_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read a counter. Tests and status endpoints use this.
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
