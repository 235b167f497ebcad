// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Strategies discovering remote changes and downloading them.

mod download;
mod full;
mod incremental;
mod queue;

pub use crate::pull::full::FullListingSync;
pub use crate::pull::incremental::IncrementalSync;
pub use crate::pull::queue::{DOWNLOAD_BATCH_SIZE, PendingDownloadQueue};

use crate::body::BodyBuilder;
use crate::context::SyncContext;
use crate::error::{ErrorContext, SyncError};
use crate::local::LocalStore;
use crate::remote::{RemoteCollection, RemoteEntry, RemoteInfo};

/// How remote changes are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// List every member and compare `ETag`s.
    FullListing,
    /// Ask for changes since the stored sync-token.
    Incremental,
}

impl Strategy {
    /// Incremental when the server supports it and no time window applies.
    #[must_use]
    pub const fn select(info: &RemoteInfo, windowed: bool) -> Self {
        if info.supports_incremental && !windowed {
            Self::Incremental
        } else {
            Self::FullListing
        }
    }
}

/// Queues a listed member for download unless the local copy has the same
/// `ETag`, and marks an existing local record present.
///
/// Presence is set here rather than after the download so a queued record
/// can never be mistaken for a server-side deletion.
async fn reconcile_entry<R, S, B>(
    ctx: &SyncContext<'_, R, S, B>,
    queue: &mut PendingDownloadQueue,
    entry: RemoteEntry,
) -> Result<(), SyncError>
where
    R: RemoteCollection,
    S: LocalStore,
    B: BodyBuilder<Item = S::Item>,
{
    let context = || ErrorContext::remote(ctx.remote.member_address(&entry.name));
    let local = ctx
        .store
        .find_by_name(&entry.name)
        .await
        .map_err(|e| SyncError::store(e, context()))?;

    match local {
        None => queue.push(entry.name),
        Some(local) => {
            ctx.store
                .mark_present(local.id)
                .await
                .map_err(|e| SyncError::store(e, context()))?;
            if !local.matches_etag(entry.etag.as_ref()) {
                queue.push(entry.name);
            }
        }
    }
    Ok(())
}
