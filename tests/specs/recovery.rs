// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Master-failover scenarios: vanished nodes and orphan adoption.

use super::common::*;
use std::sync::Arc;
use std::time::Duration;
use walsplit_coord::Store as _;
use walsplit_core::{task_node_path, ServerName, SplitConfig};
use walsplit_manager::{AllAlive, ManagerDeps, SplitLogManager};
use walsplit_worker::SplitStatus;

/// A second master spuriously deletes a task node before this master's
/// delete callback: the vanish reads as success and the finisher never runs
/// twice.
#[tokio::test]
async fn spurious_node_deletion_reads_as_success() {
    let rig = rig().await;
    let manager = Arc::new(rig.manager);
    let (_guard, wals) = wal_dir(&[("wal.1", b"abcd")]);
    let wal_path = wals.join("wal.1").to_string_lossy().into_owned();
    let node = task_node_path("/db/splitlog", &wal_path);

    let split = {
        let manager = manager.clone();
        let dirs = vec![wals.clone()];
        tokio::spawn(async move { manager.split_distributed(&dirs).await })
    };
    wait_until("task node exists", || rig.store.peek(&node).is_some()).await;

    // the other master removes the node out from under us
    rig.store.delete(&node).await.expect("delete");

    let bytes = split.await.expect("join").expect("split");
    assert_eq!(bytes, 4);
    assert_eq!(rig.finisher.call_count(), 0, "a vanished node is never double-finished");
}

/// At-least-once across a master restart: tasks the dying master enqueued
/// are adopted as orphans by its successor and still driven to completion.
#[tokio::test]
async fn master_restart_preserves_at_least_once() {
    let store;
    let wal_path;
    let wals_dir;
    let _guard;
    {
        let rig = rig().await;
        store = rig.store.clone();
        let (guard, wals) = wal_dir(&[("wal.1", b"xyz")]);
        _guard = guard;
        wal_path = wals.join("wal.1").to_string_lossy().into_owned();
        wals_dir = wals;
        let node = task_node_path("/db/splitlog", &wal_path);

        let manager = Arc::new(rig.manager);
        let split = {
            let manager = manager.clone();
            let dirs = vec![wals_dir.clone()];
            tokio::spawn(async move { manager.split_distributed(&dirs).await })
        };
        wait_until("task node exists", || store.peek(&node).is_some()).await;

        // the first master dies with the task still unassigned
        manager.stop();
        let err = split.await.expect("join").unwrap_err();
        assert!(matches!(err, walsplit_manager::ManagerError::Interrupted));
    }

    // a successor master comes up over the same store
    let finisher = RecordingFinisher::new();
    let manager2 = SplitLogManager::new(
        ManagerDeps {
            store: store.clone(),
            base_path: BASE.into(),
            server: ServerName::new("master-2"),
            finisher: finisher.clone(),
            cluster: Arc::new(AllAlive),
        },
        fast_config(),
    );
    manager2.finish_initialization(false).await.expect("init");

    let worker = start_worker(&store, "node-1", Duration::from_millis(10), SplitStatus::Done);

    wait_until("orphan finished by successor", || finisher.finished(&wal_path)).await;
    let node = task_node_path("/db/splitlog", &wal_path);
    wait_until("node deleted", || store.peek(&node).is_none()).await;

    worker.stopper.cancel();
    manager2.stop();
}

/// Recovery-only initialization skips the timeout monitor: no beacon ever
/// appears however long unassigned tasks sit idle.
#[tokio::test]
async fn recovery_mode_runs_no_monitor() {
    let store = Arc::new(walsplit_coord::MemoryStore::new());
    let finisher = RecordingFinisher::new();
    let config = SplitConfig { unassigned_timeout_ms: 20, ..fast_config() };
    let manager = SplitLogManager::new(
        ManagerDeps {
            store: store.clone(),
            base_path: BASE.into(),
            server: ServerName::new("master-1"),
            finisher,
            cluster: Arc::new(AllAlive),
        },
        config,
    );
    manager.finish_initialization(true).await.expect("init");

    let manager = Arc::new(manager);
    let (_guard, wals) = wal_dir(&[("wal.1", b"a")]);
    let _split = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.split_distributed(&[wals]).await })
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        walsplit_manager::Counters::get(&manager.counters().rescans_created),
        0,
        "no monitor, no beacons"
    );
    manager.stop();
}
