// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::body::BodyBuilder;
use crate::classify::{RemoteOp, classify};
use crate::context::SyncContext;
use crate::error::{ErrorContext, SyncError};
use crate::local::LocalStore;
use crate::remote::{RemoteCollection, RemoteResource};

/// Downloads every batch on the worker pool and applies the results.
///
/// Returns once all batches finished, with the first error if any failed.
pub(crate) async fn download_batches<R, S, B>(
    ctx: &SyncContext<'_, R, S, B>,
    batches: Vec<Vec<String>>,
) -> Result<(), SyncError>
where
    R: RemoteCollection,
    S: LocalStore,
    B: BodyBuilder<Item = S::Item>,
{
    if batches.is_empty() {
        return Ok(());
    }

    tracing::debug!(batches = batches.len(), "downloading remote changes");
    ctx.pool
        .run_all(batches.into_iter().map(|names| download_batch(ctx, names)))
        .await
        .into_iter()
        .collect()
}

async fn download_batch<R, S, B>(
    ctx: &SyncContext<'_, R, S, B>,
    names: Vec<String>,
) -> Result<(), SyncError>
where
    R: RemoteCollection,
    S: LocalStore,
    B: BodyBuilder<Item = S::Item>,
{
    ctx.check_cancelled()?;

    let resources = match ctx.remote.fetch_batch(&names).await {
        Ok(resources) => resources,
        Err(err) => {
            let resolution = classify(RemoteOp::Fetch, &err);
            let context = ErrorContext::remote(ctx.remote.address());
            return Err(SyncError::escalate(err, resolution, context));
        }
    };

    if resources.len() < names.len() {
        // Members deleted between listing and download; the next listing
        // reports them as removed.
        tracing::debug!(
            requested = names.len(),
            received = resources.len(),
            "some members vanished before download"
        );
    }

    for resource in resources {
        apply(ctx, resource).await?;
    }
    Ok(())
}

async fn apply<R, S, B>(
    ctx: &SyncContext<'_, R, S, B>,
    resource: RemoteResource,
) -> Result<(), SyncError>
where
    R: RemoteCollection,
    S: LocalStore,
    B: BodyBuilder<Item = S::Item>,
{
    let RemoteResource {
        name,
        etag,
        schedule_tag,
        body,
    } = resource;

    let item = match ctx.body.parse(&body) {
        Ok(item) => item,
        Err(err) => {
            tracing::warn!(name = %name, %err, "skipping unparseable remote record");
            ctx.counters.add_skipped();
            return Ok(());
        }
    };

    let applied = ctx
        .store
        .apply_remote(&name, etag.as_ref(), schedule_tag.as_ref(), item)
        .await
        .map_err(|e| SyncError::store(e, ErrorContext::remote(ctx.remote.member_address(&name))))?;
    ctx.counters.record_applied(applied);
    Ok(())
}
