// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! SQLite-backed record store.

mod collection;
mod records;
mod sync_states;


use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use crate::localdb::collection::CollectionStore;

use crate::body::RawItem;
use crate::error::StoreError;
use crate::local::RecordId;
use crate::localdb::records::Records;
use crate::localdb::sync_states::SyncStates;
use crate::record_type::RecordType;

/// Gives every in-memory database its own name; a shared-cache name would
/// otherwise make all of them the same database.
pub(crate) static IN_MEMORY_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Local database holding the records and sync states of any number of
/// collections.
#[derive(Debug, Clone)]
pub struct LocalDb {
    pool: SqlitePool,
    records: Records,
    sync_states: SyncStates,
}

impl LocalDb {
    /// Opens a sqlite database, creating and migrating it as needed.
    /// If `filename` is `None`, it opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database can't be opened or migrated.
    pub async fn open(filename: Option<&Path>) -> Result<Self, StoreError> {
        let options = if let Some(filename) = filename {
            tracing::info!(path = %filename.display(), "connecting to SQLite database");
            SqliteConnectOptions::new()
                .filename(filename)
                .create_if_missing(true)
        } else {
            let id = IN_MEMORY_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
            tracing::info!(id, "connecting to in-memory SQLite database");
            SqliteConnectOptions::new()
                .filename(format!("file:davsync_{id}:?mode=memory&cache=shared"))
                .in_memory(true)
                .create_if_missing(true)
        };

        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        sqlx::migrate!("src/localdb/migrations") // relative path from the crate root
            .run(&pool)
            .await?;

        Ok(Self {
            records: Records::new(pool.clone()),
            sync_states: SyncStates::new(pool.clone()),
            pool,
        })
    }

    /// The store of one collection, e.g. for a [`SyncOrchestrator`](crate::SyncOrchestrator).
    ///
    /// `collection` is any stable key, usually the collection href.
    #[must_use]
    pub fn collection(
        &self,
        collection: impl Into<String>,
        record_type: RecordType,
    ) -> CollectionStore {
        CollectionStore::new(
            collection.into(),
            record_type,
            self.records.clone(),
            self.sync_states.clone(),
        )
    }

    /// Adds a locally created record, to be uploaded by the next run.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_local(
        &self,
        collection: &str,
        record_type: RecordType,
        item: &RawItem,
    ) -> Result<RecordId, StoreError> {
        let id = self
            .records
            .insert_local(
                collection,
                item.uid.as_deref(),
                record_type.content_type(),
                &item.data,
            )
            .await?;
        tracing::debug!(collection, record = %id, "inserted local record");
        Ok(id)
    }

    /// Replaces a record locally, to be uploaded by the next run.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the record does not exist or is
    /// deleted.
    pub async fn update_local(&self, id: RecordId, item: &RawItem) -> Result<(), StoreError> {
        if self
            .records
            .update_local(id, item.uid.as_deref(), &item.data)
            .await?
        {
            tracing::debug!(record = %id, "updated local record");
            Ok(())
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    /// Deletes a record locally. Uploaded records are kept as tombstones
    /// until the next run deletes them remotely.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the record does not exist.
    pub async fn delete_local(&self, id: RecordId) -> Result<(), StoreError> {
        if self.records.delete_local(id).await? {
            tracing::debug!(record = %id, "deleted local record");
            Ok(())
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    /// Drops the stored sync state, so the next run pulls everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn forget_sync_state(&self, collection: &str) -> Result<(), StoreError> {
        tracing::info!(collection, "forgetting sync state");
        Ok(self.sync_states.delete(collection).await?)
    }

    /// Closes the database connection.
    pub async fn close(self) {
        tracing::debug!("closing database connection");
        self.pool.close().await;
    }
}
