// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Uploads local modifications and deletions.

use davsync_dav::{DavError, Precondition, PutResult};

use crate::body::{Body, BodyBuilder};
use crate::classify::{RemoteOp, Resolution, classify};
use crate::context::SyncContext;
use crate::error::{ErrorContext, SyncError};
use crate::local::{LocalRecord, LocalStore, RecordId};
use crate::remote::RemoteCollection;

/// Pushes dirty and deleted local records to the remote collection.
///
/// Both operations are idempotent: without eligible records they make no
/// remote request and return 0.
#[derive(Debug)]
pub struct LocalChangePusher<'c, 'a, R, S, B> {
    ctx: &'c SyncContext<'a, R, S, B>,
}

impl<'c, 'a, R, S, B> LocalChangePusher<'c, 'a, R, S, B>
where
    R: RemoteCollection,
    S: LocalStore,
    B: BodyBuilder<Item = S::Item>,
{
    /// Creates a pusher for the run described by `ctx`.
    pub const fn new(ctx: &'c SyncContext<'a, R, S, B>) -> Self {
        Self { ctx }
    }

    /// Deletes tombstoned records remotely, then purges them locally.
    ///
    /// Returns the number of tombstones purged.
    ///
    /// # Errors
    ///
    /// Fails on transient or authentication errors, leaving the remaining
    /// tombstones for the next run, and on local store errors.
    pub async fn push_deleted(&self) -> Result<u64, SyncError> {
        let records = self.ctx.store.find_deleted().await?;
        let mut count = 0;
        for record in records {
            if let Some(name) = &record.remote_name {
                self.ctx.check_cancelled()?;
                if let Err(err) = self.ctx.remote.delete(name, &record.precondition()).await {
                    match classify(RemoteOp::Delete, &err) {
                        Resolution::Ignorable if err.is_not_found() => {
                            tracing::debug!(record = %record.id, name = %name, "already deleted remotely");
                        }
                        Resolution::Ignorable => {
                            tracing::warn!(record = %record.id, name = %name, %err, "remote delete failed, purging anyway");
                        }
                        resolution => {
                            let context = ErrorContext::record(record.id)
                                .with_remote(self.ctx.remote.member_address(name));
                            return Err(SyncError::escalate(err, resolution, context));
                        }
                    }
                }
            }

            self.ctx
                .store
                .purge(record.id)
                .await
                .map_err(|e| SyncError::store(e, ErrorContext::record(record.id)))?;
            self.ctx.counters.add_pushed_deleted();
            count += 1;
        }

        if count > 0 {
            tracing::debug!(count, "pushed local deletions");
        }
        Ok(count)
    }

    /// Uploads modified records in parallel.
    ///
    /// Returns the number of records whose dirty flag was cleared, including
    /// uploads lost to a conflict.
    ///
    /// # Errors
    ///
    /// Fails on transient, authentication, serialization and local store
    /// errors. All uploads started finish before the error is returned.
    pub async fn push_dirty(&self) -> Result<u64, SyncError> {
        let records = self.ctx.store.find_dirty().await?;
        if records.is_empty() {
            return Ok(0);
        }

        tracing::debug!(count = records.len(), "pushing local modifications");
        let results = self
            .ctx
            .pool
            .run_all(records.into_iter().map(|record| self.push_one(record)))
            .await;

        let mut count = 0;
        let mut first_err = None;
        for result in results {
            match result {
                Ok(()) => count += 1,
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(count),
        }
    }

    async fn push_one(&self, record: LocalRecord) -> Result<(), SyncError> {
        self.ctx.check_cancelled()?;

        let id = record.id;
        let is_new = record.remote_name.is_none();
        let name = match &record.remote_name {
            Some(name) => name.clone(),
            None => self
                .ctx
                .store
                .assign_name(id)
                .await
                .map_err(|e| SyncError::store(e, ErrorContext::record(id)))?,
        };
        let context = || ErrorContext::record(id).with_remote(self.ctx.remote.member_address(&name));

        let item = self
            .ctx
            .store
            .load(id)
            .await
            .map_err(|e| SyncError::store(e, context()))?;
        let body = self.ctx.body.build(&item).map_err(|source| SyncError::Body {
            source,
            context: context(),
        })?;

        let precondition = if is_new {
            Precondition::IfNoneMatchAny
        } else {
            record.precondition()
        };

        let uploaded = match self.ctx.remote.put(&name, body.clone(), &precondition).await {
            Ok(put) => Some(put),
            Err(err) => match classify(RemoteOp::Put { update: !is_new }, &err) {
                Resolution::Ignorable => {
                    log_conflict(id, &name, &err);
                    self.ctx.counters.add_rejected();
                    None
                }
                Resolution::RestartAsFresh => {
                    tracing::info!(record = %id, name = %name, "remote resource vanished, uploading as new");
                    self.put_fresh(id, &name, body).await?
                }
                resolution => return Err(SyncError::escalate(err, resolution, context())),
            },
        };

        // Unknown tags force a re-download that recovers the server's copy.
        let (etag, schedule_tag) = match uploaded {
            Some(PutResult { etag, schedule_tag }) => (etag, schedule_tag),
            None => {
                self.ctx.counters.add_skipped();
                (None, None)
            }
        };
        self.ctx
            .store
            .clear_dirty(id, etag.as_ref(), schedule_tag.as_ref())
            .await
            .map_err(|e| SyncError::store(e, context()))?;
        self.ctx.counters.add_pushed_dirty();
        Ok(())
    }

    async fn put_fresh(
        &self,
        id: RecordId,
        name: &str,
        body: Body,
    ) -> Result<Option<PutResult>, SyncError> {
        self.ctx.check_cancelled()?;
        match self
            .ctx
            .remote
            .put(name, body, &Precondition::IfNoneMatchAny)
            .await
        {
            Ok(put) => Ok(Some(put)),
            Err(err) => match classify(RemoteOp::Put { update: false }, &err) {
                Resolution::Ignorable => {
                    log_conflict(id, name, &err);
                    self.ctx.counters.add_rejected();
                    Ok(None)
                }
                resolution => {
                    let context =
                        ErrorContext::record(id).with_remote(self.ctx.remote.member_address(name));
                    Err(SyncError::escalate(err, resolution, context))
                }
            },
        }
    }
}

fn log_conflict(id: RecordId, name: &str, err: &DavError) {
    tracing::warn!(record = %id, name, %err, "upload lost to a server-side change, re-fetching later");
}
