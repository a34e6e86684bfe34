// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manager error type.

use thiserror::Error;
use walsplit_coord::CoordError;

/// Errors surfaced to callers of the split-log manager. Transient
/// coordination trouble never appears here; only terminal batch outcomes,
/// scheduling conflicts, and caller interruption do.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("log splitting already scheduled for {0}")]
    DuplicateTask(String),
    #[error("task slot for {0} still contested after deletion")]
    StaleTask(String),
    #[error("interrupted while waiting for log splitting")]
    Interrupted,
    #[error("split batch finished with {error} error(s) out of {installed} task(s)")]
    BatchFailed { installed: usize, done: usize, error: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Coord(#[from] CoordError),
}
