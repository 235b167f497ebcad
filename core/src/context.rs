// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use tokio_util::sync::CancellationToken;

use crate::body::BodyBuilder;
use crate::error::SyncError;
use crate::local::LocalStore;
use crate::outcome::SyncCounters;
use crate::pool::WorkerPool;
use crate::record_type::RecordType;
use crate::remote::RemoteCollection;

/// Collaborators and shared state of one synchronization run.
#[derive(Debug)]
pub struct SyncContext<'a, R, S, B> {
    pub(crate) remote: &'a R,
    pub(crate) store: &'a S,
    pub(crate) body: &'a B,
    pub(crate) record_type: RecordType,
    pub(crate) pool: &'a WorkerPool,
    pub(crate) cancel: CancellationToken,
    pub(crate) counters: SyncCounters,
}

impl<'a, R, S, B> SyncContext<'a, R, S, B>
where
    R: RemoteCollection,
    S: LocalStore,
    B: BodyBuilder<Item = S::Item>,
{
    /// Creates a context for a run that is never cancelled.
    pub fn new(
        remote: &'a R,
        store: &'a S,
        body: &'a B,
        record_type: RecordType,
        pool: &'a WorkerPool,
    ) -> Self {
        Self {
            remote,
            store,
            body,
            record_type,
            pool,
            cancel: CancellationToken::new(),
            counters: SyncCounters::default(),
        }
    }

    /// Stops the run before its next remote request once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Counters accumulated so far.
    pub const fn counters(&self) -> &SyncCounters {
        &self.counters
    }

    /// Fails with [`SyncError::Cancelled`] if the run was cancelled.
    pub(crate) fn check_cancelled(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            tracing::info!("synchronization cancelled");
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }
}
