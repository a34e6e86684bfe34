// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared rig for the end-to-end specs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use walsplit_coord::MemoryStore;
use walsplit_core::{ServerName, SplitConfig};
use walsplit_manager::{
    AllAlive, FinishStatus, ManagerDeps, SplitLogManager, TaskFinisher,
};
use walsplit_worker::{SplitLogWorker, SplitStatus, WalSplitter, WorkerCounters};

pub const BASE: &str = "/db";

/// Timings tight enough that every scenario settles in well under a second
/// of wall clock.
pub fn fast_config() -> SplitConfig {
    SplitConfig {
        zk_retries: 3,
        max_resubmit: 10,
        manager_timeout_ms: 150,
        unassigned_timeout_ms: 300,
        monitor_period_ms: 10,
        report_period_ms: Some(30),
    }
}

/// Finisher recording `(worker, task)` pairs; succeeds unless told to fail.
pub struct RecordingFinisher {
    pub calls: Mutex<Vec<(ServerName, String)>>,
    failing: AtomicBool,
}

impl RecordingFinisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), failing: AtomicBool::new(false) })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn finished(&self, task: &str) -> bool {
        self.calls.lock().iter().any(|(_, t)| t == task)
    }
}

#[async_trait]
impl TaskFinisher for RecordingFinisher {
    async fn finish(&self, worker: &ServerName, task: &str) -> FinishStatus {
        self.calls.lock().push((worker.clone(), task.to_string()));
        if self.failing.load(Ordering::SeqCst) {
            FinishStatus::Err
        } else {
            FinishStatus::Done
        }
    }
}

/// Splitter with a fixed delay and outcome.
pub struct DelaySplitter {
    delay: Duration,
    result: SplitStatus,
}

impl DelaySplitter {
    pub fn new(delay: Duration, result: SplitStatus) -> Arc<Self> {
        Arc::new(Self { delay, result })
    }
}

#[async_trait]
impl WalSplitter for DelaySplitter {
    async fn split(&self, _log_path: &str, cancel: &CancellationToken) -> SplitStatus {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => self.result,
            _ = cancel.cancelled() => SplitStatus::Preempted,
        }
    }
}

pub struct TestRig {
    pub store: Arc<MemoryStore>,
    pub finisher: Arc<RecordingFinisher>,
    pub manager: SplitLogManager,
}

/// Manager with its monitor running over a fresh store.
pub async fn rig() -> TestRig {
    rig_with_config(fast_config()).await
}

pub async fn rig_with_config(config: SplitConfig) -> TestRig {
    let store = Arc::new(MemoryStore::new());
    let finisher = RecordingFinisher::new();
    let manager = SplitLogManager::new(
        ManagerDeps {
            store: store.clone(),
            base_path: BASE.into(),
            server: ServerName::new("master-1"),
            finisher: finisher.clone(),
            cluster: Arc::new(AllAlive),
        },
        config,
    );
    manager.finish_initialization(false).await.expect("manager init");
    TestRig { store, finisher, manager }
}

pub struct WorkerHandle {
    pub stopper: CancellationToken,
    pub counters: Arc<WorkerCounters>,
}

/// Start a worker against the rig's store.
pub fn start_worker(
    store: &Arc<MemoryStore>,
    name: &str,
    split_delay: Duration,
    result: SplitStatus,
) -> WorkerHandle {
    let worker = SplitLogWorker::new(
        store.clone(),
        BASE,
        ServerName::new(name),
        DelaySplitter::new(split_delay, result),
        fast_config(),
    );
    let stopper = worker.stopper();
    let counters = worker.counters();
    worker.spawn();
    WorkerHandle { stopper, counters }
}

/// Temp directory holding WAL files with the given names and contents.
pub fn wal_dir(files: &[(&str, &[u8])]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let wals = dir.path().join("wals");
    std::fs::create_dir(&wals).expect("mkdir");
    for (name, contents) in files {
        std::fs::write(wals.join(name), contents).expect("write wal");
    }
    (dir, wals)
}

/// Poll a condition until it holds; panics after ~5s.
pub async fn wait_until<F: Fn() -> bool>(what: &str, check: F) {
    for _ in 0..1_000 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}
