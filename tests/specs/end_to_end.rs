// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Happy-path and worker-death scenarios.

use super::common::*;
use std::sync::Arc;
use std::time::Duration;
use walsplit_coord::Store as _;
use walsplit_core::{is_rescan_node, task_node_path, ServerName, TaskPayload, TaskState};
use walsplit_manager::Counters;
use walsplit_worker::SplitStatus;

/// One file, one worker: claim, split, finish, delete; the return value is
/// the file's size and the source directory is gone.
#[tokio::test]
async fn clean_one_file_split() {
    let rig = rig().await;
    let worker = start_worker(&rig.store, "node-1", Duration::from_millis(10), SplitStatus::Done);
    let (_guard, wals) = wal_dir(&[("wal.1", b"0123456789abcdef")]);
    let wal_path = wals.join("wal.1").to_string_lossy().into_owned();

    let bytes = rig.manager.split_distributed(&[wals.clone()]).await.expect("split");

    assert_eq!(bytes, 16);
    assert!(!wals.exists(), "source dir removed after success");
    assert!(rig.finisher.finished(&wal_path), "finisher ran for the file");
    assert_eq!(Counters::get(&rig.manager.counters().tasks_succeeded), 1);
    assert_eq!(Counters::get(&rig.manager.counters().tasks_failed), 0);

    // the store holds no task nodes any more
    let kids = rig.store.children("/db/splitlog", None).await.expect("children");
    assert!(kids.iter().all(|k| is_rescan_node(k)), "only beacons may linger: {kids:?}");
    worker.stopper.cancel();
}

/// Worker dies mid-split: the monitor force-resubmits on the dead-worker
/// report and a second worker completes the task.
#[tokio::test]
async fn worker_crash_mid_split_recovers() {
    let rig = rig().await;
    let manager = Arc::new(rig.manager);
    // w1 would take far longer than the test; its task must be reassigned
    let w1 = start_worker(&rig.store, "node-1", Duration::from_secs(30), SplitStatus::Done);
    let (_guard, wals) = wal_dir(&[("wal.1", b"abc")]);
    let wal_path = wals.join("wal.1").to_string_lossy().into_owned();
    let node = task_node_path("/db/splitlog", &wal_path);

    let split = {
        let manager = manager.clone();
        let dirs = vec![wals.clone()];
        tokio::spawn(async move { manager.split_distributed(&dirs).await })
    };

    // wait for w1 to own the task, then kill it
    wait_until("w1 owns the task", || {
        rig.store
            .peek(&node)
            .and_then(|(data, _)| TaskPayload::from_bytes(&data).ok())
            .is_some_and(|p| p.state == TaskState::Owned && p.writer == ServerName::new("node-1"))
    })
    .await;
    w1.stopper.cancel();

    // membership reports the death; a fast replacement joins the fleet
    manager.handle_dead_worker(ServerName::new("node-1"));
    let w2 = start_worker(&rig.store, "node-2", Duration::from_millis(10), SplitStatus::Done);

    let bytes = split.await.expect("join").expect("split");

    assert_eq!(bytes, 3);
    assert!(rig.finisher.finished(&wal_path));
    assert!(Counters::get(&manager.counters().dead_worker_resubmits) >= 1);
    assert!(Counters::get(&manager.counters().resubmits) >= 1);
    w2.stopper.cancel();
}

/// No live workers for longer than the unassigned timeout: the monitor
/// plants a rescan beacon; a late worker picks everything up.
#[tokio::test]
async fn rescan_broadcast_wakes_late_workers() {
    let rig = rig().await;
    let (_guard, wals) = wal_dir(&[("wal.1", b"aa"), ("wal.2", b"bb")]);

    let manager = Arc::new(rig.manager);
    let split = {
        let manager = manager.clone();
        let dirs = vec![wals.clone()];
        tokio::spawn(async move { manager.split_distributed(&dirs).await })
    };

    // nothing claims the tasks; after the quiet period a beacon appears
    wait_until("rescan beacon created", || {
        Counters::get(&manager.counters().rescans_created) >= 1
    })
    .await;

    let worker = start_worker(&rig.store, "node-1", Duration::from_millis(5), SplitStatus::Done);
    let bytes = split.await.expect("join").expect("split");

    assert_eq!(bytes, 4);
    assert_eq!(Counters::get(&manager.counters().tasks_succeeded), 2);
    worker.stopper.cancel();
}
