// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fault injection and scheduling-conflict behavior.

use super::common::*;
use std::sync::Arc;
use std::time::Duration;
use walsplit_core::task_node_path;
use walsplit_manager::ManagerError;
use walsplit_worker::SplitStatus;

/// Arbitrary CAS failures on the store delay but never wedge a batch: claim
/// losses surface as retries, heartbeat losses as preemptions, and the
/// monitor keeps resubmitting until everything converges.
#[tokio::test]
async fn injected_cas_conflicts_still_converge() {
    let rig = rig().await;
    let manager = Arc::new(rig.manager);
    let (_guard, wals) = wal_dir(&[("wal.1", b"aa"), ("wal.2", b"bbb")]);

    rig.store.inject_cas_conflicts(6);
    let worker = start_worker(&rig.store, "node-1", Duration::from_millis(10), SplitStatus::Done);

    let split = {
        let manager = manager.clone();
        let dirs = vec![wals.clone()];
        tokio::spawn(async move { manager.split_distributed(&dirs).await })
    };

    let bytes = split.await.expect("join").expect("batch must converge");
    assert_eq!(bytes, 5);
    worker.stopper.cancel();
}

/// A worker that always resigns hands the task back; a healthy peer picks
/// it up and the batch still succeeds.
#[tokio::test]
async fn resigned_tasks_are_reassigned() {
    let rig = rig().await;
    let manager = Arc::new(rig.manager);
    let (_guard, wals) = wal_dir(&[("wal.1", b"abcde")]);

    let quitter =
        start_worker(&rig.store, "node-1", Duration::from_millis(5), SplitStatus::Resigned);

    let split = {
        let manager = manager.clone();
        let dirs = vec![wals.clone()];
        tokio::spawn(async move { manager.split_distributed(&dirs).await })
    };

    // let the quitter resign at least once, then bring up a healthy worker
    wait_until("a resignation happened", || {
        walsplit_worker::WorkerCounters::get(&quitter.counters.tasks_resigned) >= 1
    })
    .await;
    quitter.stopper.cancel();
    let healthy = start_worker(&rig.store, "node-2", Duration::from_millis(5), SplitStatus::Done);

    let bytes = split.await.expect("join").expect("split");
    assert_eq!(bytes, 5);
    healthy.stopper.cancel();
}

/// Overlapping submissions of the same log file: the second batch is
/// refused with a duplicate-schedule error and the first still completes.
#[tokio::test]
async fn overlapping_duplicate_submission_is_refused() {
    let rig = rig().await;
    let manager = Arc::new(rig.manager);
    let (_guard, wals) = wal_dir(&[("wal.1", b"dup")]);
    let wal_path = wals.join("wal.1").to_string_lossy().into_owned();
    let node = task_node_path("/db/splitlog", &wal_path);

    let split = {
        let manager = manager.clone();
        let dirs = vec![wals.clone()];
        tokio::spawn(async move { manager.split_distributed(&dirs).await })
    };
    wait_until("first batch installed", || rig.store.peek(&node).is_some()).await;

    // same directory again while the first batch is in flight
    let err = manager.split_distributed(&[wals.clone()]).await.unwrap_err();
    assert!(matches!(err, ManagerError::DuplicateTask(_)), "got {err:?}");

    let worker = start_worker(&rig.store, "node-1", Duration::from_millis(5), SplitStatus::Done);
    let bytes = split.await.expect("join").expect("first batch completes");
    assert_eq!(bytes, 3);
    worker.stopper.cancel();
}

/// A worker error is retriable, not terminal: after the erroring worker is
/// gone, the monitor puts the task back up and a healthy peer completes it.
#[tokio::test]
async fn errored_tasks_are_retried_not_failed() {
    let rig = rig().await;
    let manager = Arc::new(rig.manager);
    let (_guard, wals) = wal_dir(&[("wal.1", b"abcde")]);

    let flaky = start_worker(&rig.store, "node-1", Duration::from_millis(5), SplitStatus::Err);

    let split = {
        let manager = manager.clone();
        let dirs = vec![wals.clone()];
        tokio::spawn(async move { manager.split_distributed(&dirs).await })
    };

    wait_until("an error happened", || {
        walsplit_worker::WorkerCounters::get(&flaky.counters.tasks_errored) >= 1
    })
    .await;
    flaky.stopper.cancel();
    let healthy = start_worker(&rig.store, "node-2", Duration::from_millis(5), SplitStatus::Done);

    let bytes = split.await.expect("join").expect("batch recovers from a worker error");
    assert_eq!(bytes, 5);
    healthy.stopper.cancel();
}

/// A failing finisher on a task whose worker is alive and fresh is the
/// sanctioned path to terminal failure: the batch reports all-or-nothing
/// and the source directory survives.
#[tokio::test]
async fn failing_finisher_fails_the_batch() {
    let rig = rig().await;
    rig.finisher.set_failing(true);
    let manager = Arc::new(rig.manager);
    let (_guard, wals) = wal_dir(&[("wal.1", b"aaaa")]);

    let worker = start_worker(&rig.store, "node-1", Duration::from_millis(5), SplitStatus::Done);

    let err = {
        let manager = manager.clone();
        let dirs = vec![wals.clone()];
        tokio::spawn(async move { manager.split_distributed(&dirs).await })
            .await
            .expect("join")
            .unwrap_err()
    };

    match err {
        ManagerError::BatchFailed { installed, error, .. } => {
            assert_eq!(installed, 1);
            assert!(error >= 1);
        }
        other => panic!("expected BatchFailed, got {other:?}"),
    }
    assert!(rig.finisher.call_count() >= 1);
    assert!(wals.exists(), "failed batches never delete source dirs");
    worker.stopper.cancel();
}
