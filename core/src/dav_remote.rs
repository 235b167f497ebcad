// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! [`RemoteCollection`] over a `CalDAV`/`CardDAV` server.

use async_trait::async_trait;
use davsync_dav::{
    CalendarQueryRequest, DavClient, DavError, Href, Member, Precondition, PutResult,
};
use jiff::Timestamp;

use crate::body::Body;
use crate::record_type::RecordType;
use crate::remote::{RemoteChangeBatch, RemoteCollection, RemoteEntry, RemoteInfo, RemoteResource};
use crate::state::SyncState;

/// One calendar or address book collection on a DAV server.
#[derive(Debug, Clone)]
pub struct DavCollection {
    client: DavClient,
    href: Href,
    record_type: RecordType,
}

impl DavCollection {
    /// Creates a collection at `href` holding records of `record_type`.
    pub fn new(client: DavClient, href: impl Into<Href>, record_type: RecordType) -> Self {
        Self {
            client,
            href: href.into(),
            record_type,
        }
    }

    /// The collection href.
    #[must_use]
    pub const fn href(&self) -> &Href {
        &self.href
    }

    fn entries(members: Vec<Member>) -> Vec<RemoteEntry> {
        members
            .into_iter()
            .filter_map(|member| {
                let name = member.href.last_segment();
                (!name.is_empty()).then(|| RemoteEntry::new(name, member.etag))
            })
            .collect()
    }
}

#[async_trait]
impl RemoteCollection for DavCollection {
    fn address(&self) -> &str {
        self.href.as_str()
    }

    fn member_address(&self, name: &str) -> String {
        self.href.join(name).as_str().to_string()
    }

    async fn query(&self) -> Result<RemoteInfo, DavError> {
        let info = self.client.collection_info(&self.href).await?;
        Ok(RemoteInfo {
            supports_incremental: info.supports_sync_collection && info.sync_token.is_some(),
            ctag: info.ctag,
            sync_token: info.sync_token,
        })
    }

    async fn list_all(&self, since: Option<Timestamp>) -> Result<Vec<RemoteEntry>, DavError> {
        let members = match (since, self.record_type.component()) {
            (Some(since), Some(component)) => {
                let start = since.strftime("%Y%m%dT%H%M%SZ").to_string();
                let query = CalendarQueryRequest::new()
                    .component(component.to_string())
                    .time_range(start, None);
                self.client.query_members(&self.href, &query).await?
            }
            _ => self.client.list_members(&self.href).await?,
        };
        Ok(Self::entries(members))
    }

    async fn list_changes(&self, token: Option<&str>) -> Result<RemoteChangeBatch, DavError> {
        let page = self.client.sync_collection(&self.href, token).await?;
        let Some(next) = page.sync_token else {
            return Err(DavError::InvalidResponse(
                "sync-collection response without sync-token".to_string(),
            ));
        };

        let removed = page
            .removed
            .iter()
            .map(Href::last_segment)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Ok(RemoteChangeBatch {
            changed: Self::entries(page.changed),
            removed,
            // Whether this belongs to an initial listing is tracked by the caller.
            state: SyncState::sync_token(next, false),
            has_more: page.truncated,
        })
    }

    async fn fetch_batch(&self, names: &[String]) -> Result<Vec<RemoteResource>, DavError> {
        let hrefs: Vec<Href> = names.iter().map(|name| self.href.join(name)).collect();
        let resources = self
            .client
            .multiget(&self.href, self.record_type.multiget_kind(), &hrefs)
            .await?;

        Ok(resources
            .into_iter()
            .map(|resource| RemoteResource {
                name: resource.href.last_segment().to_string(),
                etag: resource.etag,
                schedule_tag: resource.schedule_tag,
                body: Body {
                    bytes: resource.data.into_bytes(),
                    content_type: self.record_type.content_type().to_string(),
                },
            })
            .collect())
    }

    async fn put(
        &self,
        name: &str,
        body: Body,
        precondition: &Precondition,
    ) -> Result<PutResult, DavError> {
        let href = self.href.join(name);
        self.client
            .put(&href, body.bytes, &body.content_type, precondition)
            .await
    }

    async fn delete(&self, name: &str, precondition: &Precondition) -> Result<(), DavError> {
        self.client.delete(&self.href.join(name), precondition).await
    }
}
