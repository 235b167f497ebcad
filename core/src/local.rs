// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use async_trait::async_trait;
use davsync_dav::{ETag, Precondition};

use crate::error::StoreError;
use crate::record_type::RecordType;
use crate::state::SyncState;

/// Identity of a local record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Synchronization metadata of a local record.
///
/// A record with `deleted` set is never `dirty`, and a record without a
/// `remote_name` has never been uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRecord {
    /// Local identity.
    pub id: RecordId,
    /// Server-side resource name, assigned before the first upload.
    pub remote_name: Option<String>,
    /// Last known `ETag`, `None` when unknown.
    pub etag: Option<ETag>,
    /// Last known `Schedule-Tag`, preferred over the `ETag` for conditions.
    pub schedule_tag: Option<ETag>,
    /// Locally modified since the last upload.
    pub dirty: bool,
    /// Locally deleted, waiting for the remote delete.
    pub deleted: bool,
    /// Seen in the current listing pass.
    pub present: bool,
}

impl LocalRecord {
    /// Precondition protecting an update or delete of this record.
    #[must_use]
    pub fn precondition(&self) -> Precondition {
        if let Some(tag) = &self.schedule_tag {
            Precondition::IfScheduleTagMatch(tag.clone())
        } else if let Some(tag) = &self.etag {
            Precondition::IfMatch(tag.clone())
        } else {
            Precondition::None
        }
    }

    /// Whether the local copy already matches a listed `ETag`.
    ///
    /// A listing without `ETag` never matches.
    #[must_use]
    pub fn matches_etag(&self, etag: Option<&ETag>) -> bool {
        etag.is_some() && self.etag.as_ref() == etag
    }
}

/// How [`LocalStore::apply_remote`] treated a downloaded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new local record was created.
    Inserted,
    /// An existing local record was overwritten.
    Updated,
    /// The local record has unsynchronized changes and was left alone.
    Kept,
}

/// Local record store of one collection.
///
/// Implementations own the records and their sync metadata; the sync core
/// only drives them through this contract.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Domain object produced by parsing a downloaded body.
    type Item: Send;

    /// Records with local modifications.
    async fn find_dirty(&self) -> Result<Vec<LocalRecord>, StoreError>;

    /// Records deleted locally.
    async fn find_deleted(&self) -> Result<Vec<LocalRecord>, StoreError>;

    /// Looks up a record by its remote name.
    async fn find_by_name(&self, name: &str) -> Result<Option<LocalRecord>, StoreError>;

    /// Marks a record as seen in the current listing.
    async fn mark_present(&self, id: RecordId) -> Result<(), StoreError>;

    /// Clears the presence flag of every non-dirty record.
    async fn reset_presence_flags(&self) -> Result<(), StoreError>;

    /// Deletes every non-dirty record not seen since the last reset.
    async fn purge_absent(&self) -> Result<u64, StoreError>;

    /// Stores a downloaded record under `name`, inserting or overwriting.
    ///
    /// The stored record is clean and marked present.
    async fn apply_remote(
        &self,
        name: &str,
        etag: Option<&ETag>,
        schedule_tag: Option<&ETag>,
        item: Self::Item,
    ) -> Result<Applied, StoreError>;

    /// Records a finished upload. `None` tags mean "unknown, re-fetch".
    async fn clear_dirty(
        &self,
        id: RecordId,
        etag: Option<&ETag>,
        schedule_tag: Option<&ETag>,
    ) -> Result<(), StoreError>;

    /// Gives a never-uploaded record its remote name and returns it.
    async fn assign_name(&self, id: RecordId) -> Result<String, StoreError>;

    /// Physically removes a record.
    async fn purge(&self, id: RecordId) -> Result<(), StoreError>;

    /// Removes the record with this remote name, returning whether one existed.
    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError>;

    /// Loads the domain object of a record for upload.
    async fn load(&self, id: RecordId) -> Result<Self::Item, StoreError>;

    /// The persisted sync state, `None` before the first successful pull.
    async fn load_sync_state(&self) -> Result<Option<SyncState>, StoreError>;

    /// Persists the sync state.
    async fn save_sync_state(&self, state: &SyncState) -> Result<(), StoreError>;

    /// Collection-specific fix-ups after a pull, e.g. contact group
    /// membership. Does nothing by default.
    async fn post_process(&self, _record_type: RecordType) -> Result<(), StoreError> {
        Ok(())
    }
}
