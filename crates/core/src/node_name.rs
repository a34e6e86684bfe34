// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node naming for the coordination store.
//!
//! Task nodes live flat under one parent, so the log file path (which
//! contains directory separators) is escaped into a single child name.
//! Rescan beacons share the same parent and are told apart by a well-known
//! prefix plus the sequence suffix the store appends on create.

use thiserror::Error;

/// Prefix of rescan beacon nodes. The store appends a sequence number, so a
/// live beacon is always `RESCAN<digits>`.
pub const RESCAN_PREFIX: &str = "RESCAN";

/// Escape a task name (a log file path) into a flat child name.
///
/// URL-style escaping of `%` and `/` only; everything else passes through,
/// keeping node names readable in store dumps.
pub fn encode_task_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`encode_task_name`].
pub fn decode_task_name(node: &str) -> Result<String, NodeNameError> {
    let mut out = String::with_capacity(node.len());
    let mut chars = node.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let hex: String = chars.by_ref().take(2).collect();
        match hex.as_str() {
            "25" => out.push('%'),
            "2F" | "2f" => out.push('/'),
            _ => return Err(NodeNameError::BadEscape(hex)),
        }
    }
    Ok(out)
}

/// Full node path for a task under the splitlog parent.
pub fn task_node_path(parent: &str, task_name: &str) -> String {
    format!("{}/{}", parent, encode_task_name(task_name))
}

/// Last path component.
pub fn node_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether a node path names a rescan beacon rather than a task.
///
/// Beacons are `RESCAN` followed by the store-assigned sequence digits. The
/// digit check keeps a log file whose escaped name merely starts with the
/// prefix from being misclassified.
pub fn is_rescan_node(path: &str) -> bool {
    let base = node_basename(path);
    match base.strip_prefix(RESCAN_PREFIX) {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeNameError {
    #[error("bad escape sequence in node name: %{0}")]
    BadEscape(String),
}

#[cfg(test)]
#[path = "node_name_tests.rs"]
mod tests;
