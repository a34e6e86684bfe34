// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for the split-log manager and workers. Each field mirrors one of
/// the recognized dotted configuration options; embedders deserialize this
/// from whatever configuration source they carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// `splitlog.zk.retries`: retry budget for each coordination op.
    pub zk_retries: u32,
    /// `splitlog.max.resubmit`: per-task CHECK-resubmit threshold.
    /// FORCE resubmits do not count against it.
    pub max_resubmit: u32,
    /// `splitlog.manager.timeout`: ms after a task's last heartbeat before
    /// a CHECK resubmit may fire.
    pub manager_timeout_ms: u64,
    /// `splitlog.manager.unassigned.timeout`: ms of nothing-assigned before
    /// the monitor pings workers with a rescan beacon.
    pub unassigned_timeout_ms: u64,
    /// `splitlog.manager.timeoutmonitor.period`: ms between monitor ticks.
    pub monitor_period_ms: u64,
    /// `splitlog.worker.report.period`: ms between worker heartbeats while
    /// splitting. `None` derives a third of `manager_timeout_ms`.
    pub report_period_ms: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            zk_retries: 3,
            max_resubmit: 3,
            manager_timeout_ms: 120_000,
            unassigned_timeout_ms: 180_000,
            monitor_period_ms: 1_000,
            report_period_ms: None,
        }
    }
}

impl SplitConfig {
    pub fn manager_timeout(&self) -> Duration {
        Duration::from_millis(self.manager_timeout_ms)
    }

    pub fn monitor_period(&self) -> Duration {
        Duration::from_millis(self.monitor_period_ms)
    }

    /// Worker heartbeat cadence: explicit value, or a third of the manager
    /// timeout so two heartbeats land inside every timeout window.
    pub fn report_period(&self) -> Duration {
        let ms = self.report_period_ms.unwrap_or(self.manager_timeout_ms / 3);
        Duration::from_millis(ms.max(1))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
