// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-split task finisher seam.

use async_trait::async_trait;
use walsplit_core::ServerName;

/// Outcome of a finisher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishStatus {
    Done,
    Err,
}

/// Pluggable post-processor run once per successful task before its node is
/// deleted. Typical implementations move per-region recovered-edits files
/// from the worker's staging directory into the target region directories.
///
/// Must be idempotent and restartable: a task can be finished again after a
/// master restart, and `worker` names whoever produced the final transition,
/// not necessarily every worker that ever touched the task.
#[async_trait]
pub trait TaskFinisher: Send + Sync + 'static {
    async fn finish(&self, worker: &ServerName, task: &str) -> FinishStatus;
}

/// Finisher for embedders whose split computation leaves nothing to move.
pub struct NoopFinisher;

#[async_trait]
impl TaskFinisher for NoopFinisher {
    async fn finish(&self, _worker: &ServerName, _task: &str) -> FinishStatus {
        FinishStatus::Done
    }
}
