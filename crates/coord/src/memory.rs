// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store implementation.
//!
//! Single-process stand-in for the real coordination service, with the same
//! observable semantics: per-node versions, conditional writes, sequential
//! name assignment, one-shot watches. Fault injection hooks let tests force
//! CAS conflicts, connection loss, and session expiry on live traffic.

use crate::error::CoordError;
use crate::store::{CreateMode, Store, WatchEvent, WatchKind, WatchSender};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
struct Node {
    data: Vec<u8>,
    version: i64,
}

#[derive(Default)]
struct Faults {
    cas_conflicts: u32,
    connection_losses: u32,
    expired: bool,
}

#[derive(Default)]
struct State {
    // BTreeMap keeps children listings deterministic
    nodes: BTreeMap<String, Node>,
    seqs: HashMap<String, u64>,
    data_watches: HashMap<String, Vec<WatchSender>>,
    child_watches: HashMap<String, Vec<WatchSender>>,
    faults: Faults,
}

/// In-memory [`Store`].
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` conditional writes with `BadVersion`.
    pub fn inject_cas_conflicts(&self, n: u32) {
        self.state.lock().faults.cas_conflicts = n;
    }

    /// Fail the next `n` operations (any kind) with `ConnectionLoss`.
    pub fn inject_connection_loss(&self, n: u32) {
        self.state.lock().faults.connection_losses = n;
    }

    /// Expire the session: every subsequent operation fails fatally.
    pub fn expire_session(&self) {
        self.state.lock().faults.expired = true;
    }

    /// Raw read without arming a watch; test helper.
    pub fn peek(&self, path: &str) -> Option<(Vec<u8>, i64)> {
        let state = self.state.lock();
        state.nodes.get(path).map(|n| (n.data.clone(), n.version))
    }

    fn take_fault(state: &mut State) -> Option<CoordError> {
        if state.faults.expired {
            return Some(CoordError::SessionExpired);
        }
        if state.faults.connection_losses > 0 {
            state.faults.connection_losses -= 1;
            return Some(CoordError::ConnectionLoss);
        }
        None
    }

    fn fire_data(state: &mut State, path: &str, kind: WatchKind) {
        if let Some(watchers) = state.data_watches.remove(path) {
            for w in watchers {
                let _ = w.send(WatchEvent { kind, path: path.to_string() });
            }
        }
    }

    fn fire_children(state: &mut State, parent: &str) {
        if let Some(watchers) = state.child_watches.remove(parent) {
            for w in watchers {
                let _ = w.send(WatchEvent {
                    kind: WatchKind::ChildrenChanged,
                    path: parent.to_string(),
                });
            }
        }
    }

    fn parent_of(path: &str) -> Option<&str> {
        let idx = path.rfind('/')?;
        if idx == 0 {
            None
        } else {
            Some(&path[..idx])
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create(
        &self,
        path: &str,
        data: &[u8],
        mode: CreateMode,
    ) -> Result<String, CoordError> {
        let mut state = self.state.lock();
        if let Some(err) = Self::take_fault(&mut state) {
            return Err(err);
        }
        if let Some(parent) = Self::parent_of(path) {
            if !state.nodes.contains_key(parent) {
                return Err(CoordError::NoNode(parent.to_string()));
            }
        }
        let full_path = if mode.is_sequential() {
            let seq = state.seqs.entry(path.to_string()).or_insert(0);
            *seq += 1;
            format!("{}{:010}", path, *seq)
        } else {
            path.to_string()
        };
        if state.nodes.contains_key(&full_path) {
            return Err(CoordError::NodeExists(full_path));
        }
        state.nodes.insert(full_path.clone(), Node { data: data.to_vec(), version: 0 });
        Self::fire_data(&mut state, &full_path, WatchKind::NodeCreated);
        if let Some(parent) = Self::parent_of(&full_path) {
            let parent = parent.to_string();
            Self::fire_children(&mut state, &parent);
        }
        Ok(full_path)
    }

    async fn set_data(
        &self,
        path: &str,
        data: &[u8],
        expected: i64,
    ) -> Result<i64, CoordError> {
        let mut state = self.state.lock();
        if let Some(err) = Self::take_fault(&mut state) {
            return Err(err);
        }
        if expected >= 0 && state.faults.cas_conflicts > 0 {
            state.faults.cas_conflicts -= 1;
            return Err(CoordError::BadVersion(path.to_string()));
        }
        let node = state
            .nodes
            .get_mut(path)
            .ok_or_else(|| CoordError::NoNode(path.to_string()))?;
        if expected >= 0 && node.version != expected {
            return Err(CoordError::BadVersion(path.to_string()));
        }
        node.data = data.to_vec();
        node.version += 1;
        let version = node.version;
        Self::fire_data(&mut state, path, WatchKind::DataChanged);
        Ok(version)
    }

    async fn get_data(
        &self,
        path: &str,
        watch: Option<WatchSender>,
    ) -> Result<(Vec<u8>, i64), CoordError> {
        let mut state = self.state.lock();
        if let Some(err) = Self::take_fault(&mut state) {
            return Err(err);
        }
        let node = state
            .nodes
            .get(path)
            .ok_or_else(|| CoordError::NoNode(path.to_string()))?;
        let result = (node.data.clone(), node.version);
        if let Some(watch) = watch {
            state.data_watches.entry(path.to_string()).or_default().push(watch);
        }
        Ok(result)
    }

    async fn delete(&self, path: &str) -> Result<(), CoordError> {
        let mut state = self.state.lock();
        if let Some(err) = Self::take_fault(&mut state) {
            return Err(err);
        }
        if state.nodes.remove(path).is_none() {
            return Err(CoordError::NoNode(path.to_string()));
        }
        state.seqs.remove(path);
        Self::fire_data(&mut state, path, WatchKind::NodeDeleted);
        if let Some(parent) = Self::parent_of(path) {
            let parent = parent.to_string();
            Self::fire_children(&mut state, &parent);
        }
        Ok(())
    }

    async fn children(
        &self,
        path: &str,
        watch: Option<WatchSender>,
    ) -> Result<Vec<String>, CoordError> {
        let mut state = self.state.lock();
        if let Some(err) = Self::take_fault(&mut state) {
            return Err(err);
        }
        if !state.nodes.contains_key(path) {
            return Err(CoordError::NoNode(path.to_string()));
        }
        let prefix = format!("{}/", path);
        let kids = state
            .nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('/'))
            .map(|(k, _)| k[prefix.len()..].to_string())
            .collect();
        if let Some(watch) = watch {
            state.child_watches.entry(path.to_string()).or_default().push(watch);
        }
        Ok(kids)
    }

    async fn exists(&self, path: &str) -> Result<Option<i64>, CoordError> {
        let mut state = self.state.lock();
        if let Some(err) = Self::take_fault(&mut state) {
            return Err(err);
        }
        Ok(state.nodes.get(path).map(|n| n.version))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
