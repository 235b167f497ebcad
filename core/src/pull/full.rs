// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;

use crate::body::BodyBuilder;
use crate::classify::{RemoteOp, classify};
use crate::context::SyncContext;
use crate::error::{ErrorContext, SyncError};
use crate::local::LocalStore;
use crate::pull::download::download_batches;
use crate::pull::queue::PendingDownloadQueue;
use crate::pull::reconcile_entry;
use crate::remote::RemoteCollection;

/// Pulls by listing every member and comparing `ETag`s.
///
/// Records the listing no longer contains are deleted once the listing and
/// downloads are complete.
#[derive(Debug)]
pub struct FullListingSync<'c, 'a, R, S, B> {
    ctx: &'c SyncContext<'a, R, S, B>,
    since: Option<Timestamp>,
}

impl<'c, 'a, R, S, B> FullListingSync<'c, 'a, R, S, B>
where
    R: RemoteCollection,
    S: LocalStore,
    B: BodyBuilder<Item = S::Item>,
{
    /// Creates the strategy; `since` limits the listing to a time window.
    pub const fn new(ctx: &'c SyncContext<'a, R, S, B>, since: Option<Timestamp>) -> Self {
        Self { ctx, since }
    }

    /// Runs one full listing pass.
    ///
    /// # Errors
    ///
    /// Fails on any remote or local store error; the store may then hold
    /// some downloads, which are valid on their own.
    pub async fn pull(&self) -> Result<(), SyncError> {
        let ctx = self.ctx;
        ctx.store.reset_presence_flags().await?;

        ctx.check_cancelled()?;
        let entries = ctx.remote.list_all(self.since).await.map_err(|err| {
            let resolution = classify(RemoteOp::List, &err);
            SyncError::escalate(err, resolution, ErrorContext::remote(ctx.remote.address()))
        })?;
        tracing::debug!(members = entries.len(), "listed remote collection");

        let mut queue = PendingDownloadQueue::default();
        for entry in entries {
            reconcile_entry(ctx, &mut queue, entry).await?;
        }
        download_batches(ctx, queue.take_batches()).await?;

        let purged = ctx.store.purge_absent().await?;
        if purged > 0 {
            tracing::debug!(purged, "deleted records removed on the server");
        }
        ctx.counters.add_deleted(purged);
        Ok(())
    }
}
