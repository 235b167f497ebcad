// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::{SignedDuration, Timestamp};

use crate::pool::WorkerPool;
use crate::record_type::RecordType;

/// Behaviour of synchronization runs.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SyncConfig {
    /// Only list events overlapping the last N days.
    ///
    /// Forces the full-listing strategy for events.
    #[serde(default)]
    pub time_window_days: Option<u32>,

    /// Parallel uploads/downloads per run.
    #[serde(default = "WorkerPool::default_size")]
    pub max_parallelism: usize,

    /// Pull even if the collection version is unchanged.
    #[serde(default)]
    pub force_pull: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            time_window_days: None,
            max_parallelism: WorkerPool::default_size(),
            force_pull: false,
        }
    }
}

impl SyncConfig {
    /// Length of the listing window for `record_type` in days, if one applies.
    #[must_use]
    pub fn window_days(&self, record_type: RecordType) -> Option<u32> {
        self.time_window_days
            .filter(|_| record_type.supports_time_window())
    }

    /// Start of the listing window for `record_type`, if one applies.
    #[must_use]
    pub fn window_start(&self, record_type: RecordType, now: Timestamp) -> Option<Timestamp> {
        let days = self.window_days(record_type)?;
        let span = SignedDuration::from_hours(i64::from(days) * 24);
        match now.checked_sub(span) {
            Ok(start) => Some(start),
            Err(e) => {
                tracing::warn!(days, err = %e, "time window out of range, listing everything");
                None
            }
        }
    }
}
