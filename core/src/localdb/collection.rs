// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use davsync_dav::ETag;
use uuid::Uuid;

use crate::body::RawItem;
use crate::error::StoreError;
use crate::local::{Applied, LocalRecord, LocalStore, RecordId};
use crate::localdb::records::{Records, RemoteRow};
use crate::localdb::sync_states::SyncStates;
use crate::record_type::RecordType;
use crate::state::SyncState;

/// The records of one collection in a [`LocalDb`](crate::LocalDb).
#[derive(Debug, Clone)]
pub struct CollectionStore {
    name: String,
    record_type: RecordType,
    records: Records,
    sync_states: SyncStates,
}

impl CollectionStore {
    pub(crate) const fn new(
        name: String,
        record_type: RecordType,
        records: Records,
        sync_states: SyncStates,
    ) -> Self {
        Self {
            name,
            record_type,
            records,
            sync_states,
        }
    }

    /// The collection name records are filed under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get(&self, id: RecordId) -> Result<Option<LocalRecord>, StoreError> {
        Ok(self.records.get(id).await?)
    }
}

#[async_trait]
impl LocalStore for CollectionStore {
    type Item = RawItem;

    async fn find_dirty(&self) -> Result<Vec<LocalRecord>, StoreError> {
        Ok(self.records.find_dirty(&self.name).await?)
    }

    async fn find_deleted(&self) -> Result<Vec<LocalRecord>, StoreError> {
        Ok(self.records.find_deleted(&self.name).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<LocalRecord>, StoreError> {
        Ok(self.records.find_by_name(&self.name, name).await?)
    }

    async fn mark_present(&self, id: RecordId) -> Result<(), StoreError> {
        Ok(self.records.mark_present(id).await?)
    }

    async fn reset_presence_flags(&self) -> Result<(), StoreError> {
        Ok(self.records.reset_presence(&self.name).await?)
    }

    async fn purge_absent(&self) -> Result<u64, StoreError> {
        Ok(self.records.purge_absent(&self.name).await?)
    }

    async fn apply_remote(
        &self,
        name: &str,
        etag: Option<&ETag>,
        schedule_tag: Option<&ETag>,
        item: RawItem,
    ) -> Result<Applied, StoreError> {
        let row = RemoteRow {
            name,
            etag: etag.map(ETag::as_str),
            schedule_tag: schedule_tag.map(ETag::as_str),
            uid: item.uid.as_deref(),
            content_type: self.record_type.content_type(),
            body: &item.data,
        };

        match self.records.find_by_name(&self.name, name).await? {
            None => {
                self.records.insert_remote(&self.name, &row).await?;
                Ok(Applied::Inserted)
            }
            Some(local) if local.dirty => {
                tracing::debug!(record = %local.id, name, "keeping locally modified record");
                Ok(Applied::Kept)
            }
            Some(local) => {
                if self.records.overwrite_remote(local.id, &row).await? {
                    Ok(Applied::Updated)
                } else {
                    Ok(Applied::Kept)
                }
            }
        }
    }

    async fn clear_dirty(
        &self,
        id: RecordId,
        etag: Option<&ETag>,
        schedule_tag: Option<&ETag>,
    ) -> Result<(), StoreError> {
        if self.records.clear_dirty(id, etag, schedule_tag).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    async fn assign_name(&self, id: RecordId) -> Result<String, StoreError> {
        let name = format!("{}.{}", Uuid::new_v4(), self.record_type.extension());
        if self.records.set_remote_name(id, &name).await? {
            return Ok(name);
        }

        // Already named by an earlier, interrupted upload.
        self.records
            .get(id)
            .await?
            .and_then(|record| record.remote_name)
            .ok_or(StoreError::NotFound(id))
    }

    async fn purge(&self, id: RecordId) -> Result<(), StoreError> {
        Ok(self.records.delete(id).await?)
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.records.delete_by_name(&self.name, name).await?)
    }

    async fn load(&self, id: RecordId) -> Result<RawItem, StoreError> {
        self.records
            .body(id)
            .await?
            .map(RawItem::new)
            .ok_or(StoreError::NotFound(id))
    }

    async fn load_sync_state(&self) -> Result<Option<SyncState>, StoreError> {
        match self.sync_states.get(&self.name).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save_sync_state(&self, state: &SyncState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        tracing::debug!(collection = %self.name, state = %json, "saving sync state");
        Ok(self.sync_states.upsert(&self.name, &json).await?)
    }
}
