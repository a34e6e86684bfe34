// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster membership seam.

use walsplit_core::ServerName;

/// Liveness view of the worker fleet, supplied by the embedding master's
/// membership service. The monitor consults it before deciding whether a
/// silent worker has merely stalled or is gone.
pub trait ClusterView: Send + Sync + 'static {
    fn is_alive(&self, server: &ServerName) -> bool;
}

/// View that reports every worker alive; timeouts alone drive resubmits.
pub struct AllAlive;

impl ClusterView for AllAlive {
    fn is_alive(&self, _server: &ServerName) -> bool {
        true
    }
}
