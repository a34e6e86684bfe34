// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination-store error taxonomy.

use thiserror::Error;

/// Errors surfaced by [`crate::Store`] implementations.
///
/// `NoNode`, `NodeExists`, and `BadVersion` are logical conflicts: soft
/// signals that someone else acted first, handled by re-reading or moving
/// on. `ConnectionLoss` and `Timeout` are transient and retried against a
/// budget. `SessionExpired` is fatal for the holder of the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("no node: {0}")]
    NoNode(String),
    #[error("node already exists: {0}")]
    NodeExists(String),
    #[error("bad version on {0}")]
    BadVersion(String),
    #[error("coordination session expired")]
    SessionExpired,
    #[error("connection to coordination store lost")]
    ConnectionLoss,
    #[error("coordination op timed out")]
    Timeout,
    #[error("coordination error: {0}")]
    Other(String),
}

impl CoordError {
    /// Worth re-issuing the same op.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoordError::ConnectionLoss | CoordError::Timeout)
    }

    /// The session is gone; retrying on it can never succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoordError::SessionExpired)
    }
}
