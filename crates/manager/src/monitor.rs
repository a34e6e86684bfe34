// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout monitor.
//!
//! A single background task runs one tick per configured period. Each tick
//! drains the dead-worker set, force-resubmits tasks owned by dead workers,
//! CHECK-resubmits the rest (the resubmit gate enforces the heartbeat
//! timeout), rebroadcasts a rescan beacon when nothing is assigned for too
//! long, and retries failed node deletions.

use crate::counters::Counters;
use crate::manager::Inner;
use crate::task::{ResubmitDirective, ResubmitOutcome, Task, TerminationStatus};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use walsplit_coord::RetryBudget;
use walsplit_core::{Clock, ServerName};

pub(crate) fn spawn<C: Clock>(inner: Arc<Inner<C>>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(inner.config.monitor_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = inner.stopper.cancelled() => break,
                _ = ticker.tick() => inner.monitor_tick().await,
            }
        }
        tracing::debug!("split-log timeout monitor stopped");
    });
}

impl<C: Clock> Inner<C> {
    pub(crate) async fn monitor_tick(&self) {
        if self.client.is_expired() {
            tracing::error!("coordination session expired, stopping split-log manager");
            self.stopper.cancel();
            return;
        }

        let dead: HashSet<ServerName> = self.dead_workers.lock().drain().collect();
        let snapshot: Vec<(String, Arc<Task>)> =
            self.tasks.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        let mut unassigned: Vec<(String, Arc<Task>)> = Vec::new();
        let mut found_assigned = false;
        for (path, task) in snapshot {
            let (status, worker) = {
                let data = task.data.lock();
                (data.status, data.cur_worker.clone())
            };
            if status != TerminationStatus::InProgress {
                continue;
            }
            let Some(worker) = worker else {
                // don't rush unassigned tasks: a worker takes one task at a
                // time and may be busy for a long while
                unassigned.push((path, task));
                continue;
            };
            found_assigned = true;
            if dead.contains(&worker) {
                Counters::bump(&self.counters.dead_worker_resubmits);
                tracing::info!(path, worker = %worker, "resubmitting task of dead worker");
                if self.resubmit(&path, &task, ResubmitDirective::Force).await
                    == ResubmitOutcome::Skipped
                {
                    tracing::warn!(path, worker = %worker, "failed to resubmit dead worker's task, will retry");
                    self.dead_workers.lock().insert(worker);
                }
            } else {
                self.resubmit(&path, &task, ResubmitDirective::Check).await;
            }
        }

        // nothing is making progress: refresh watches that may have vanished
        // with their store session, then ping workers with a fresh beacon
        if !found_assigned && !unassigned.is_empty() {
            let quiet = self
                .clock
                .now_ms()
                .saturating_sub(self.last_node_create_ms.load(Ordering::SeqCst));
            if quiet > self.config.unassigned_timeout_ms as i64 {
                Counters::bump(&self.counters.unassigned_rebroadcasts);
                tracing::debug!(
                    count = unassigned.len(),
                    "rebroadcasting unassigned tasks after quiet period"
                );
                for (path, task) in &unassigned {
                    // tasks get assigned asynchronously; re-check under lock
                    let still_unassigned = {
                        let data = task.data.lock();
                        data.status == TerminationStatus::InProgress && data.is_unassigned()
                    };
                    if still_unassigned {
                        let _ = self
                            .client
                            .get_data(path, Some(self.watch_tx.clone()), RetryBudget::best_effort())
                            .await;
                    }
                }
                self.create_rescan_node();
            }
        }

        let failed: Vec<String> = self.failed_deletions.lock().drain().collect();
        for path in failed {
            self.delete_node(path);
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
