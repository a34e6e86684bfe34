// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hierarchical versioned store trait.

use crate::error::CoordError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// How a node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    Persistent,
    /// Persistent node whose name gets a store-assigned sequence suffix.
    PersistentSequential,
    /// Removed by the store when the creating session ends.
    Ephemeral,
    EphemeralSequential,
}

impl CreateMode {
    pub fn is_sequential(self) -> bool {
        matches!(self, CreateMode::PersistentSequential | CreateMode::EphemeralSequential)
    }

    pub fn is_ephemeral(self) -> bool {
        matches!(self, CreateMode::Ephemeral | CreateMode::EphemeralSequential)
    }
}

/// What a one-shot watch observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    DataChanged,
    NodeDeleted,
    NodeCreated,
    ChildrenChanged,
}

/// Notification delivered to whoever registered a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchKind,
    pub path: String,
}

/// Channel end a watcher registers; the store pushes at most one event per
/// registration (watches are one-shot and must be re-armed by re-reading).
pub type WatchSender = mpsc::UnboundedSender<WatchEvent>;

/// The coordination store: a hierarchical namespace of versioned byte blobs.
///
/// Node versions start at 0 on create and increment by one on every
/// successful `set_data`. A negative `expected` version matches any version
/// (unconditional write). Parents must exist before children are created.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Create a node. Returns the final path, which differs from the request
    /// for sequential modes.
    async fn create(
        &self,
        path: &str,
        data: &[u8],
        mode: CreateMode,
    ) -> Result<String, CoordError>;

    /// Conditional write. Returns the new version. `BadVersion` when
    /// `expected >= 0` and does not match.
    async fn set_data(&self, path: &str, data: &[u8], expected: i64)
        -> Result<i64, CoordError>;

    /// Read data and version, optionally arming a one-shot watch that fires
    /// on the node's next data change or deletion.
    async fn get_data(
        &self,
        path: &str,
        watch: Option<WatchSender>,
    ) -> Result<(Vec<u8>, i64), CoordError>;

    /// Delete a node regardless of version.
    async fn delete(&self, path: &str) -> Result<(), CoordError>;

    /// List direct child names, optionally arming a one-shot watch that
    /// fires when the child set changes. `NoNode` when the parent is absent.
    async fn children(
        &self,
        path: &str,
        watch: Option<WatchSender>,
    ) -> Result<Vec<String>, CoordError>;

    /// Current version of a node, or `None` if it does not exist.
    async fn exists(&self, path: &str) -> Result<Option<i64>, CoordError>;
}
