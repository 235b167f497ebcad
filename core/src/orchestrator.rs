// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use jiff::Timestamp;
use tokio_util::sync::CancellationToken;

use crate::body::BodyBuilder;
use crate::classify::{RemoteOp, classify};
use crate::config::SyncConfig;
use crate::context::SyncContext;
use crate::error::{ErrorContext, SyncError};
use crate::gate::{ConcurrencyGate, GateKey};
use crate::local::LocalStore;
use crate::outcome::{SyncOutcome, SyncStatus};
use crate::pool::{MAX_WORKERS, WorkerPool};
use crate::pull::{FullListingSync, IncrementalSync, Strategy};
use crate::push::LocalChangePusher;
use crate::record_type::RecordType;
use crate::remote::{RemoteCollection, RemoteInfo};

/// Runs synchronization of one local collection with its remote
/// counterpart.
///
/// A run pushes local deletions and modifications first, then pulls remote
/// changes unless the stored [`SyncState`](crate::SyncState) shows the local
/// copy is current and no upload was refused.
#[derive(Debug)]
pub struct SyncOrchestrator<R, S, B> {
    remote: R,
    store: S,
    body: B,
    record_type: RecordType,
    config: SyncConfig,
    gate: Arc<ConcurrencyGate>,
    key: GateKey,
    cancel: CancellationToken,
}

impl<R, S, B> SyncOrchestrator<R, S, B>
where
    R: RemoteCollection,
    S: LocalStore,
    B: BodyBuilder<Item = S::Item>,
{
    /// Creates an orchestrator with default configuration and a private
    /// gate.
    pub fn new(remote: R, store: S, body: B, record_type: RecordType, key: GateKey) -> Self {
        Self {
            remote,
            store,
            body,
            record_type,
            config: SyncConfig::default(),
            gate: Arc::new(ConcurrencyGate::new()),
            key,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the run configuration.
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares `gate` with other orchestrators so runs for the same key
    /// exclude each other.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<ConcurrencyGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Aborts runs before their next remote request once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The remote collection.
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// The local store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Runs one synchronization.
    ///
    /// Never fails: errors are reported in [`SyncOutcome::error`] together
    /// with the counters reached before the failure. Returns
    /// [`SyncStatus::Busy`] at once if a run for the same key is active.
    #[tracing::instrument(skip(self), fields(key = %self.key, record_type = %self.record_type))]
    pub async fn run(&self) -> SyncOutcome {
        let Some(_guard) = self.gate.try_acquire(self.key.clone()) else {
            tracing::info!("another run is active, skipping");
            return SyncOutcome::busy();
        };

        let pool = WorkerPool::new(self.config.max_parallelism.min(MAX_WORKERS));
        let ctx = SyncContext::new(
            &self.remote,
            &self.store,
            &self.body,
            self.record_type,
            &pool,
        )
        .with_cancellation(self.cancel.clone());

        tracing::info!(remote = self.remote.address(), "synchronization started");
        let outcome = match self.sync(&ctx).await {
            Ok(status) => SyncOutcome::new(status, ctx.counters(), None),
            Err(err) => {
                tracing::error!(%err, "synchronization failed");
                SyncOutcome::new(SyncStatus::Failed, ctx.counters(), Some(err))
            }
        };

        tracing::info!(
            status = ?outcome.status,
            inserted = outcome.inserted,
            updated = outcome.updated,
            deleted = outcome.deleted,
            skipped = outcome.skipped,
            pushed_dirty = outcome.pushed_dirty,
            pushed_deleted = outcome.pushed_deleted,
            "synchronization finished"
        );
        outcome
    }

    async fn sync(&self, ctx: &SyncContext<'_, R, S, B>) -> Result<SyncStatus, SyncError> {
        let mut info = self.query(ctx).await?;
        let stored = self.store.load_sync_state().await?;

        let pusher = LocalChangePusher::new(ctx);
        let pushed = pusher.push_deleted().await? + pusher.push_dirty().await?;
        if pushed > 0 {
            // Uploads changed the collection version.
            info = self.query(ctx).await?;
        }

        let since = self.config.window_start(self.record_type, Timestamp::now());
        let strategy = Strategy::select(&info, since.is_some());
        let window = since.and(self.config.window_days(self.record_type));
        let remote_state = match strategy {
            Strategy::FullListing => info.listing_state().map(|s| s.with_window(window)),
            Strategy::Incremental => info.incremental_state(),
        };

        // A refused upload leaves the server copy untouched, so neither the
        // collection version nor the change list reports it.
        let rejected = ctx.counters.rejected() > 0;
        let unchanged = stored
            .as_ref()
            .zip(remote_state.as_ref())
            .is_some_and(|(stored, remote)| stored.matches(remote));
        if unchanged && !rejected && !self.config.force_pull {
            tracing::info!("collection unchanged, nothing to pull");
            return Ok(SyncStatus::UpToDate);
        }

        tracing::info!(
            ?strategy,
            windowed = since.is_some(),
            rejected,
            "pulling remote changes"
        );
        match strategy {
            Strategy::FullListing => {
                FullListingSync::new(ctx, since).pull().await?;
                self.post_process(ctx).await?;
                // Without any version from the server the next run pulls
                // again, which is always correct.
                if let Some(state) = &remote_state {
                    self.store.save_sync_state(state).await?;
                }
            }
            Strategy::Incremental => {
                let since_token = if rejected { None } else { stored.as_ref() };
                IncrementalSync::new(ctx).pull(since_token).await?;
                self.post_process(ctx).await?;
            }
        }
        Ok(SyncStatus::Completed)
    }

    async fn query(&self, ctx: &SyncContext<'_, R, S, B>) -> Result<RemoteInfo, SyncError> {
        ctx.check_cancelled()?;
        let info = self.remote.query().await.map_err(|err| {
            let resolution = classify(RemoteOp::Query, &err);
            SyncError::escalate(err, resolution, ErrorContext::remote(self.remote.address()))
        })?;
        tracing::debug!(
            supports_incremental = info.supports_incremental,
            ctag = ?info.ctag,
            sync_token = ?info.sync_token,
            "queried remote collection"
        );
        Ok(info)
    }

    async fn post_process(&self, ctx: &SyncContext<'_, R, S, B>) -> Result<(), SyncError> {
        if ctx.record_type.has_post_processing() {
            tracing::debug!("post-processing collection");
            self.store.post_process(ctx.record_type).await?;
        }
        Ok(())
    }
}
