// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use davsync_dav::{DavError, ETag, Precondition, PutResult};
use jiff::Timestamp;

use crate::body::Body;
use crate::state::SyncState;

/// Capabilities and version of a remote collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteInfo {
    /// Whether changes can be listed incrementally with a sync-token.
    pub supports_incremental: bool,
    /// Collection tag, if the server has one.
    pub ctag: Option<String>,
    /// Current sync-token, if the server has one.
    pub sync_token: Option<String>,
}

impl RemoteInfo {
    /// The state a full listing compares against and stores.
    ///
    /// Falls back to the sync-token used as an opaque version when the
    /// server has no collection tag.
    #[must_use]
    pub fn listing_state(&self) -> Option<SyncState> {
        self.ctag
            .as_ref()
            .or(self.sync_token.as_ref())
            .map(SyncState::ctag)
    }

    /// The state an incremental listing compares against.
    #[must_use]
    pub fn incremental_state(&self) -> Option<SyncState> {
        self.sync_token
            .as_ref()
            .map(|token| SyncState::sync_token(token, false))
    }
}

/// A listed member: its name and `ETag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Resource name within the collection.
    pub name: String,
    /// `ETag`, if the server reported one.
    pub etag: Option<ETag>,
}

impl RemoteEntry {
    /// Creates an entry.
    pub fn new(name: impl Into<String>, etag: Option<ETag>) -> Self {
        Self {
            name: name.into(),
            etag,
        }
    }
}

/// One round of an incremental listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChangeBatch {
    /// Members added or modified.
    pub changed: Vec<RemoteEntry>,
    /// Names of members removed.
    pub removed: Vec<String>,
    /// State to resume from after this round.
    pub state: SyncState,
    /// Whether the server has more changes to report.
    pub has_more: bool,
}

/// A downloaded resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResource {
    /// Resource name within the collection.
    pub name: String,
    /// `ETag` of the downloaded version.
    pub etag: Option<ETag>,
    /// `Schedule-Tag` of the downloaded version.
    pub schedule_tag: Option<ETag>,
    /// The body.
    pub body: Body,
}

/// A remote collection of records.
///
/// Errors are raw transport errors; the sync core classifies them.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Address of the collection, used in diagnostics.
    fn address(&self) -> &str;

    /// Address of a member, used in diagnostics.
    fn member_address(&self, name: &str) -> String {
        format!("{}/{name}", self.address().trim_end_matches('/'))
    }

    /// Reads capabilities and the current version.
    async fn query(&self) -> Result<RemoteInfo, DavError>;

    /// Lists every member, optionally only those overlapping `[since, ∞)`.
    async fn list_all(&self, since: Option<Timestamp>) -> Result<Vec<RemoteEntry>, DavError>;

    /// Lists changes since `token`; `None` starts an initial listing.
    ///
    /// Fails with [`DavError::TokenInvalid`] when the token is rejected.
    async fn list_changes(&self, token: Option<&str>) -> Result<RemoteChangeBatch, DavError>;

    /// Downloads several members at once.
    async fn fetch_batch(&self, names: &[String]) -> Result<Vec<RemoteResource>, DavError>;

    /// Uploads a member.
    async fn put(
        &self,
        name: &str,
        body: Body,
        precondition: &Precondition,
    ) -> Result<PutResult, DavError>;

    /// Deletes a member.
    async fn delete(&self, name: &str, precondition: &Precondition) -> Result<(), DavError>;
}
