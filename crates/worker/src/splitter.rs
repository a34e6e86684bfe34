// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL split computation seam.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Outcome of splitting one WAL file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStatus {
    /// Recovered edits written; the task is done.
    Done,
    /// Permanent failure on this worker.
    Err,
    /// Voluntary give-up; another worker should try later.
    Resigned,
    /// Ownership was lost mid-split; no terminal state may be published.
    Preempted,
}

/// The split computation itself: replay one WAL file into recovered-edits
/// files for each affected region. Everything about filesystem layout is the
/// implementation's business; the worker only routes the outcome.
///
/// Implementations should watch `cancel` and bail out promptly once it
/// fires; the worker cancels it when task ownership is lost.
#[async_trait]
pub trait WalSplitter: Send + Sync + 'static {
    async fn split(&self, log_path: &str, cancel: &CancellationToken) -> SplitStatus;
}
