// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SyncError;
use crate::local::Applied;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Local changes were pushed and remote changes pulled.
    Completed,
    /// Local changes were pushed; the collection was unchanged, no pull.
    UpToDate,
    /// Another run for the same key was active; nothing was done.
    Busy,
    /// The run was aborted, see [`SyncOutcome::error`].
    Failed,
}

/// Result of one synchronization run.
#[derive(Debug)]
pub struct SyncOutcome {
    /// How the run ended.
    pub status: SyncStatus,
    /// Records downloaded as new.
    pub inserted: u64,
    /// Records overwritten by a download.
    pub updated: u64,
    /// Records deleted locally because the server no longer has them.
    pub deleted: u64,
    /// Records whose download or upload was absorbed or unparseable.
    pub skipped: u64,
    /// Local modifications uploaded.
    pub pushed_dirty: u64,
    /// Local deletions pushed.
    pub pushed_deleted: u64,
    /// Why the run failed.
    pub error: Option<SyncError>,
}

impl SyncOutcome {
    pub(crate) fn new(status: SyncStatus, counters: &SyncCounters, error: Option<SyncError>) -> Self {
        Self {
            status,
            inserted: counters.inserted(),
            updated: counters.updated(),
            deleted: counters.deleted(),
            skipped: counters.skipped(),
            pushed_dirty: counters.pushed_dirty(),
            pushed_deleted: counters.pushed_deleted(),
            error,
        }
    }

    pub(crate) fn busy() -> Self {
        Self::new(SyncStatus::Busy, &SyncCounters::default(), None)
    }

    /// Whether the run finished without error.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Total local records changed by the pull.
    #[must_use]
    pub const fn pulled(&self) -> u64 {
        self.inserted + self.updated + self.deleted
    }
}

/// Counters shared by the parallel jobs of a run.
#[derive(Debug, Default)]
pub struct SyncCounters {
    inserted: AtomicU64,
    updated: AtomicU64,
    deleted: AtomicU64,
    skipped: AtomicU64,
    pushed_dirty: AtomicU64,
    pushed_deleted: AtomicU64,
    rejected: AtomicU64,
}

impl SyncCounters {
    pub(crate) fn record_applied(&self, applied: Applied) {
        let counter = match applied {
            Applied::Inserted => &self.inserted,
            Applied::Updated => &self.updated,
            Applied::Kept => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_deleted(&self, n: u64) {
        self.deleted.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_pushed_dirty(&self) {
        self.pushed_dirty.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_pushed_deleted(&self) {
        self.pushed_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts an upload the server refused without changing the resource.
    pub(crate) fn add_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Uploads refused by the server, whose copy must be fetched again.
    pub(crate) fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Records downloaded as new.
    pub fn inserted(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    /// Records overwritten by a download.
    pub fn updated(&self) -> u64 {
        self.updated.load(Ordering::Relaxed)
    }

    /// Records deleted because the server no longer has them.
    pub fn deleted(&self) -> u64 {
        self.deleted.load(Ordering::Relaxed)
    }

    /// Records absorbed or unparseable.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Local modifications uploaded.
    pub fn pushed_dirty(&self) -> u64 {
        self.pushed_dirty.load(Ordering::Relaxed)
    }

    /// Local deletions pushed.
    pub fn pushed_deleted(&self) -> u64 {
        self.pushed_deleted.load(Ordering::Relaxed)
    }
}
