// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::body::BodyBuilder;
use crate::classify::{RemoteOp, Resolution, classify};
use crate::context::SyncContext;
use crate::error::{ErrorContext, SyncError};
use crate::local::LocalStore;
use crate::pull::download::download_batches;
use crate::pull::queue::PendingDownloadQueue;
use crate::pull::reconcile_entry;
use crate::remote::RemoteCollection;
use crate::state::SyncState;

/// Pulls changes since the stored sync-token.
///
/// Without a finished token the collection goes through an initial listing
/// first: every page marks what it reports as present, and records never
/// reported are deleted once the last page arrived. The token is persisted
/// after every page, so an interrupted listing resumes where it stopped.
#[derive(Debug)]
pub struct IncrementalSync<'c, 'a, R, S, B> {
    ctx: &'c SyncContext<'a, R, S, B>,
}

impl<'c, 'a, R, S, B> IncrementalSync<'c, 'a, R, S, B>
where
    R: RemoteCollection,
    S: LocalStore,
    B: BodyBuilder<Item = S::Item>,
{
    /// Creates the strategy.
    pub const fn new(ctx: &'c SyncContext<'a, R, S, B>) -> Self {
        Self { ctx }
    }

    /// Pulls every page of changes, returning the persisted final state.
    ///
    /// A rejected token restarts as an initial listing instead of failing.
    ///
    /// # Errors
    ///
    /// Fails on any other remote or local store error. Pages completed
    /// before the failure stay persisted.
    pub async fn pull(&self, stored: Option<&SyncState>) -> Result<SyncState, SyncError> {
        let ctx = self.ctx;
        let mut token = stored.and_then(SyncState::token).map(str::to_string);
        let mut initial = match stored {
            Some(SyncState::SyncToken {
                initial_sync_in_progress,
                ..
            }) => *initial_sync_in_progress,
            _ => true,
        };

        // An interrupted initial listing already reset the flags and marked
        // what its earlier pages reported.
        if initial && !stored.is_some_and(SyncState::is_initial_in_progress) {
            tracing::info!("starting initial listing");
            ctx.store.reset_presence_flags().await?;
        }

        loop {
            ctx.check_cancelled()?;
            let batch = match ctx.remote.list_changes(token.as_deref()).await {
                Ok(batch) => batch,
                Err(err) => match classify(RemoteOp::ListChanges, &err) {
                    Resolution::RestartAsFresh if token.is_some() => {
                        tracing::info!("sync-token rejected, restarting initial listing");
                        token = None;
                        initial = true;
                        ctx.store.reset_presence_flags().await?;
                        continue;
                    }
                    resolution => {
                        let context = ErrorContext::remote(ctx.remote.address());
                        return Err(SyncError::escalate(err, resolution, context));
                    }
                },
            };

            tracing::debug!(
                changed = batch.changed.len(),
                removed = batch.removed.len(),
                has_more = batch.has_more,
                "received change page"
            );

            for name in &batch.removed {
                let deleted = ctx.store.delete_by_name(name).await.map_err(|e| {
                    SyncError::store(e, ErrorContext::remote(ctx.remote.member_address(name)))
                })?;
                if deleted {
                    ctx.counters.add_deleted(1);
                }
            }

            let mut queue = PendingDownloadQueue::default();
            for entry in batch.changed {
                reconcile_entry(ctx, &mut queue, entry).await?;
            }
            // Downloads finish before the token that covers them is stored.
            download_batches(ctx, queue.take_batches()).await?;

            let Some(next) = batch.state.token().map(str::to_string) else {
                let context = ErrorContext::remote(ctx.remote.address());
                return Err(SyncError::Remote {
                    source: davsync_dav::DavError::InvalidResponse(
                        "change listing returned no sync-token".to_string(),
                    ),
                    context,
                });
            };

            let stalled = token.as_deref() == Some(next.as_str());
            if batch.has_more && !stalled {
                ctx.store
                    .save_sync_state(&SyncState::sync_token(&next, initial))
                    .await?;
                token = Some(next);
                continue;
            }
            if batch.has_more {
                tracing::warn!("server reported more changes without advancing the token");
            }

            if initial {
                let purged = ctx.store.purge_absent().await?;
                tracing::info!(purged, "initial listing finished");
                ctx.counters.add_deleted(purged);
            }
            let state = SyncState::sync_token(next, false);
            ctx.store.save_sync_state(&state).await?;
            return Ok(state);
        }
    }
}
