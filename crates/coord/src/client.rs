// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recoverable client: budgeted retries over the raw store.
//!
//! Every async op carries a [`RetryBudget`]. Transient failures are retried
//! until the budget runs out; logical conflicts surface immediately; session
//! expiry latches a fatal flag the embedding process must observe and treat
//! as a shutdown signal. The fail-silent variants implement the contract
//! callers opt into by name: `NoNode` on delete and `NodeExists` on create
//! are successes there, not errors.

use crate::error::CoordError;
use crate::store::{CreateMode, Store, WatchSender};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How many times an op may be re-issued after transient failures.
///
/// A best-effort budget swallows every error: used to probe node liveness
/// (refresh a watch) where the outcome must not affect state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget(i64);

impl RetryBudget {
    pub fn limited(retries: u32) -> Self {
        Self(i64::from(retries))
    }

    pub fn best_effort() -> Self {
        Self(-1)
    }

    pub fn is_best_effort(&self) -> bool {
        self.0 < 0
    }

    /// Consume one retry. False when the budget is spent.
    fn take(&mut self) -> bool {
        if self.0 <= 0 {
            return false;
        }
        self.0 -= 1;
        true
    }
}

/// Store handle with retry and session-expiry bookkeeping. Cheap to clone;
/// clones share the expiry latch.
#[derive(Clone)]
pub struct RecoverableClient {
    store: Arc<dyn Store>,
    expired: Arc<AtomicBool>,
    retry_delay: Duration,
}

impl RecoverableClient {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, expired: Arc::new(AtomicBool::new(false)), retry_delay: Duration::from_millis(50) }
    }

    /// Override the pause between retries (tests use a short one).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// True once any op has observed `SessionExpired`. The session never
    /// recovers; the holder is expected to stop.
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// Retry loop shared by every op. Transient errors consume budget,
    /// logical conflicts surface immediately, expiry latches and aborts.
    async fn with_retries<T, F, Fut>(
        &self,
        op: &str,
        path: &str,
        mut budget: RetryBudget,
        mut f: F,
    ) -> Result<T, CoordError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoordError>>,
    {
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_fatal() => {
                    self.expired.store(true, Ordering::SeqCst);
                    tracing::error!(op, path, "coordination session expired");
                    return Err(e);
                }
                Err(e) if e.is_transient() && !budget.is_best_effort() => {
                    if !budget.take() {
                        tracing::warn!(op, path, error = %e, "retry budget exhausted");
                        return Err(e);
                    }
                    tracing::debug!(op, path, error = %e, "transient failure, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Create a node. `NodeExists` surfaces to the caller.
    pub async fn create(
        &self,
        path: &str,
        data: &[u8],
        mode: CreateMode,
        budget: RetryBudget,
    ) -> Result<String, CoordError> {
        self.with_retries("create", path, budget, || self.store.create(path, data, mode))
            .await
    }

    /// Fail-silent create: an existing node is success (`Ok(None)`).
    pub async fn create_ignore_exists(
        &self,
        path: &str,
        data: &[u8],
        mode: CreateMode,
        budget: RetryBudget,
    ) -> Result<Option<String>, CoordError> {
        match self.create(path, data, mode, budget).await {
            Ok(full) => Ok(Some(full)),
            Err(CoordError::NodeExists(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a sequential child of `parent` named `prefix` plus the
    /// store-assigned sequence number.
    pub async fn create_sequential(
        &self,
        parent: &str,
        prefix: &str,
        data: &[u8],
        budget: RetryBudget,
    ) -> Result<String, CoordError> {
        let path = format!("{}/{}", parent, prefix);
        self.with_retries("create_sequential", &path, budget, || {
            self.store.create(&path, data, CreateMode::PersistentSequential)
        })
        .await
    }

    /// Create every missing component of `path` as a persistent node.
    pub async fn ensure_path(&self, path: &str, budget: RetryBudget) -> Result<(), CoordError> {
        let mut prefix = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            prefix.push('/');
            prefix.push_str(component);
            self.create_ignore_exists(&prefix, b"", CreateMode::Persistent, budget).await?;
        }
        Ok(())
    }

    /// Read data and version, optionally arming a one-shot watch. The watch
    /// is re-registered on every retry attempt.
    pub async fn get_data(
        &self,
        path: &str,
        watch: Option<WatchSender>,
        budget: RetryBudget,
    ) -> Result<(Vec<u8>, i64), CoordError> {
        self.with_retries("get_data", path, budget, || {
            self.store.get_data(path, watch.clone())
        })
        .await
    }

    /// Liveness probe: swallow every error, including `NoNode`.
    pub async fn get_data_best_effort(&self, path: &str) -> Option<(Vec<u8>, i64)> {
        match self
            .with_retries("get_data", path, RetryBudget::best_effort(), || {
                self.store.get_data(path, None)
            })
            .await
        {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(path, error = %e, "best-effort get_data failed");
                None
            }
        }
    }

    /// Conditional write returning the new version, or `Ok(None)` when the
    /// expected version no longer matches (lost the race). `expected < 0`
    /// writes unconditionally. `NoNode` surfaces: the caller decides what a
    /// vanished node means.
    pub async fn set_data_version(
        &self,
        path: &str,
        data: &[u8],
        expected: i64,
        budget: RetryBudget,
    ) -> Result<Option<i64>, CoordError> {
        match self
            .with_retries("set_data", path, budget, || self.store.set_data(path, data, expected))
            .await
        {
            Ok(version) => Ok(Some(version)),
            Err(CoordError::BadVersion(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Conditional write collapsed to a bool: false means version mismatch.
    pub async fn set_data_cas(
        &self,
        path: &str,
        data: &[u8],
        expected: i64,
        budget: RetryBudget,
    ) -> Result<bool, CoordError> {
        Ok(self.set_data_version(path, data, expected, budget).await?.is_some())
    }

    /// Fail-silent delete: a missing node is success.
    pub async fn delete_ignore_missing(
        &self,
        path: &str,
        budget: RetryBudget,
    ) -> Result<(), CoordError> {
        match self
            .with_retries("delete", path, budget, || self.store.delete(path))
            .await
        {
            Ok(()) => Ok(()),
            Err(CoordError::NoNode(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// List children, optionally arming a one-shot child watch. `Ok(None)`
    /// iff the parent does not exist.
    pub async fn children(
        &self,
        path: &str,
        watch: Option<WatchSender>,
        budget: RetryBudget,
    ) -> Result<Option<Vec<String>>, CoordError> {
        match self
            .with_retries("children", path, budget, || self.store.children(path, watch.clone()))
            .await
        {
            Ok(kids) => Ok(Some(kids)),
            Err(CoordError::NoNode(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Current node version, or `None` when absent.
    pub async fn exists(&self, path: &str, budget: RetryBudget) -> Result<Option<i64>, CoordError> {
        self.with_retries("exists", path, budget, || self.store.exists(path)).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
