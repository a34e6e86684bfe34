// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for manager tests.

use crate::cluster::ClusterView;
use crate::finisher::{FinishStatus, TaskFinisher};
use crate::manager::{ManagerDeps, SplitLogManager};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use walsplit_coord::MemoryStore;
use walsplit_core::{task_node_path, FakeClock, ServerName, SplitConfig};

pub(crate) const PARENT: &str = "/db/splitlog";

pub(crate) fn task_path(name: &str) -> String {
    task_node_path(PARENT, name)
}

/// Finisher that records calls and replays queued outcomes (default Done).
pub(crate) struct RecordingFinisher {
    pub calls: Mutex<Vec<(ServerName, String)>>,
    queued: Mutex<Vec<FinishStatus>>,
}

impl RecordingFinisher {
    pub fn new() -> Self {
        Self { calls: Mutex::new(Vec::new()), queued: Mutex::new(Vec::new()) }
    }

    /// Queue the outcome of the next finish call.
    pub fn push_result(&self, status: FinishStatus) {
        self.queued.lock().push(status);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl TaskFinisher for RecordingFinisher {
    async fn finish(&self, worker: &ServerName, task: &str) -> FinishStatus {
        self.calls.lock().push((worker.clone(), task.to_string()));
        let mut queued = self.queued.lock();
        if queued.is_empty() {
            FinishStatus::Done
        } else {
            queued.remove(0)
        }
    }
}

/// Cluster view where workers are alive unless marked dead.
pub(crate) struct FakeCluster {
    dead: Mutex<HashSet<ServerName>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self { dead: Mutex::new(HashSet::new()) }
    }

    pub fn mark_dead(&self, worker: impl Into<ServerName>) {
        self.dead.lock().insert(worker.into());
    }
}

impl ClusterView for FakeCluster {
    fn is_alive(&self, server: &ServerName) -> bool {
        !self.dead.lock().contains(server)
    }
}

pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: FakeClock,
    pub finisher: Arc<RecordingFinisher>,
    pub cluster: Arc<FakeCluster>,
    pub manager: SplitLogManager<FakeClock>,
}

pub(crate) fn test_config() -> SplitConfig {
    SplitConfig {
        zk_retries: 3,
        max_resubmit: 2,
        manager_timeout_ms: 1_000,
        unassigned_timeout_ms: 2_000,
        monitor_period_ms: 10,
        report_period_ms: Some(50),
    }
}

/// Manager over a fresh in-memory store, initialized in recovery mode so no
/// background monitor runs; tests drive ticks by hand.
pub(crate) async fn setup() -> Harness {
    setup_with_config(test_config()).await
}

pub(crate) async fn setup_with_config(config: SplitConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let finisher = Arc::new(RecordingFinisher::new());
    let cluster = Arc::new(FakeCluster::new());
    let manager = SplitLogManager::with_clock(
        ManagerDeps {
            store: store.clone(),
            base_path: "/db".into(),
            server: ServerName::new("master-1"),
            finisher: finisher.clone(),
            cluster: cluster.clone(),
        },
        config,
        clock.clone(),
    );
    manager.finish_initialization(true).await.unwrap();
    Harness { store, clock, finisher, cluster, manager }
}

/// Poll a condition until it holds; panics after ~2s of retries.
pub(crate) async fn wait_until<F: Fn() -> bool>(what: &str, check: F) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}
