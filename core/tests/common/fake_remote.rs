// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Scripted in-process stand-in for a `CalDAV`/`CardDAV` collection.
//!
//! Every change bumps a collection version. Sync-tokens are `v{base}` or,
//! for a page of a longer listing, `v{base}.{offset}`; base 0 is the
//! initial listing. `ETag`s are `"e{version}"`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use davsync_core::{
    Body, RecordType, RemoteChangeBatch, RemoteCollection, RemoteEntry, RemoteInfo,
    RemoteResource, SyncState,
};
use davsync_dav::{DavError, ETag, Precondition, PutResult};
use jiff::Timestamp;
use tokio_util::sync::CancellationToken;

/// Kind of remote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Query,
    ListAll,
    ListChanges,
    FetchBatch,
    Put,
    Delete,
}

/// A recorded remote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Query,
    ListAll(Option<Timestamp>),
    ListChanges(Option<String>),
    FetchBatch(Vec<String>),
    Put(String, Precondition),
    Delete(String, Precondition),
}

impl Call {
    pub const fn op(&self) -> Op {
        match self {
            Self::Query => Op::Query,
            Self::ListAll(_) => Op::ListAll,
            Self::ListChanges(_) => Op::ListChanges,
            Self::FetchBatch(_) => Op::FetchBatch,
            Self::Put(..) => Op::Put,
            Self::Delete(..) => Op::Delete,
        }
    }
}

#[derive(Debug)]
struct Resource {
    etag: ETag,
    schedule_tag: Option<ETag>,
    data: String,
}

#[derive(Debug, Default)]
struct Server {
    version: u64,
    resources: BTreeMap<String, Resource>,
    /// Version of the last change of every name ever stored.
    changes: BTreeMap<String, u64>,
    /// Tokens with an older base are rejected.
    min_token: u64,
    incremental: bool,
    page_size: Option<usize>,
    omit_put_etag: bool,
    /// Failures as (request kind, calls to let pass first, error).
    failures: Vec<(Op, usize, DavError)>,
    cancel_on: Option<(Op, CancellationToken)>,
    /// Removed right before the next download.
    remove_on_fetch: Vec<String>,
    calls: Vec<Call>,
}

impl Server {
    fn bump(&mut self, name: &str) -> u64 {
        self.version += 1;
        self.changes.insert(name.to_string(), self.version);
        self.version
    }

    fn store(&mut self, name: &str, data: String, schedule_tag: Option<ETag>) -> ETag {
        let version = self.bump(name);
        let etag = ETag::from(format!("\"e{version}\""));
        self.resources.insert(
            name.to_string(),
            Resource {
                etag: etag.clone(),
                schedule_tag,
                data,
            },
        );
        etag
    }

    fn begin(&mut self, call: Call) -> Result<(), DavError> {
        let op = call.op();
        self.calls.push(call);
        if let Some((_, token)) = self.cancel_on.as_ref().filter(|(o, _)| *o == op) {
            token.cancel();
        }

        let Some(pos) = self.failures.iter().position(|(o, ..)| *o == op) else {
            return Ok(());
        };
        let entry = &mut self.failures[pos];
        if entry.1 > 0 {
            entry.1 -= 1;
            Ok(())
        } else {
            Err(self.failures.remove(pos).2)
        }
    }

    fn check(&self, name: &str, precondition: &Precondition) -> Result<(), DavError> {
        let current = self.resources.get(name);
        let ok = match precondition {
            Precondition::None => true,
            Precondition::IfNoneMatchAny => current.is_none(),
            Precondition::IfMatch(tag) => current.is_some_and(|r| &r.etag == tag),
            Precondition::IfScheduleTagMatch(tag) => {
                current.is_some_and(|r| r.schedule_tag.as_ref() == Some(tag))
            }
        };
        if ok {
            Ok(())
        } else {
            Err(DavError::PreconditionFailed(name.to_string()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeRemote {
    address: String,
    server: Arc<Mutex<Server>>,
}

impl FakeRemote {
    /// A collection listed by full listing only.
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            server: Arc::new(Mutex::new(Server::default())),
        }
    }

    /// A collection that also supports sync-collection.
    pub fn incremental(address: &str) -> Self {
        let remote = Self::new(address);
        remote.server().incremental = true;
        remote
    }

    fn server(&self) -> MutexGuard<'_, Server> {
        self.server.lock().unwrap()
    }

    /// Limits change listings to `size` entries per page.
    pub fn set_page_size(&self, size: usize) {
        self.server().page_size = Some(size);
    }

    /// Makes uploads answer without `ETag` header.
    pub fn set_omit_put_etag(&self, omit: bool) {
        self.server().omit_put_etag = omit;
    }

    /// Stores a resource as another client would.
    pub fn insert(&self, name: &str, data: &str) -> ETag {
        self.server().store(name, data.to_string(), None)
    }

    /// Stores a resource carrying a `Schedule-Tag`.
    pub fn insert_scheduled(&self, name: &str, data: &str, schedule_tag: &str) -> ETag {
        self.server()
            .store(name, data.to_string(), Some(ETag::from(schedule_tag)))
    }

    /// Deletes a resource as another client would.
    pub fn remove(&self, name: &str) {
        let mut server = self.server();
        if server.resources.remove(name).is_some() {
            server.bump(name);
        }
    }

    /// Rejects every token issued so far.
    pub fn invalidate_tokens(&self) {
        let mut server = self.server();
        server.min_token = server.version + 1;
    }

    /// Fails the next request of kind `op`.
    pub fn fail_next(&self, op: Op, err: DavError) {
        self.fail_after(op, 0, err);
    }

    /// Lets `pass` requests of kind `op` succeed, then fails the next one.
    pub fn fail_after(&self, op: Op, pass: usize, err: DavError) {
        self.server().failures.push((op, pass, err));
    }

    /// Cancels `token` as soon as a request of kind `op` arrives.
    pub fn cancel_on(&self, op: Op, token: CancellationToken) {
        self.server().cancel_on = Some((op, token));
    }

    /// Removes `name` right before the next download, as a concurrent
    /// client would.
    pub fn remove_on_fetch(&self, name: &str) {
        self.server().remove_on_fetch.push(name.to_string());
    }

    pub fn etag(&self, name: &str) -> Option<ETag> {
        self.server().resources.get(name).map(|r| r.etag.clone())
    }

    pub fn data(&self, name: &str) -> Option<String> {
        self.server().resources.get(name).map(|r| r.data.clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.server().resources.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.server().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.server().calls.clear();
    }

    pub fn count(&self, op: Op) -> usize {
        self.server().calls.iter().filter(|c| c.op() == op).count()
    }

    /// Names requested by every batched download, in order.
    pub fn fetch_batches(&self) -> Vec<Vec<String>> {
        self.server()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::FetchBatch(names) => Some(names.clone()),
                _ => None,
            })
            .collect()
    }

    /// Preconditions of every upload, in order.
    pub fn puts(&self) -> Vec<(String, Precondition)> {
        self.server()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Put(name, precondition) => Some((name.clone(), precondition.clone())),
                _ => None,
            })
            .collect()
    }

    /// The token the server reports for its current version.
    pub fn current_token(&self) -> String {
        format!("v{}", self.server().version)
    }
}

fn parse_token(token: &str) -> Option<(u64, usize)> {
    let token = token.strip_prefix('v')?;
    match token.split_once('.') {
        Some((base, offset)) => Some((base.parse().ok()?, offset.parse().ok()?)),
        None => Some((token.parse().ok()?, 0)),
    }
}

#[async_trait]
impl RemoteCollection for FakeRemote {
    fn address(&self) -> &str {
        &self.address
    }

    async fn query(&self) -> Result<RemoteInfo, DavError> {
        let mut server = self.server();
        server.begin(Call::Query)?;
        Ok(RemoteInfo {
            supports_incremental: server.incremental,
            ctag: Some(format!("c{}", server.version)),
            sync_token: server
                .incremental
                .then(|| format!("v{}", server.version)),
        })
    }

    async fn list_all(&self, since: Option<Timestamp>) -> Result<Vec<RemoteEntry>, DavError> {
        let mut server = self.server();
        server.begin(Call::ListAll(since))?;
        Ok(server
            .resources
            .iter()
            .map(|(name, r)| RemoteEntry::new(name.clone(), Some(r.etag.clone())))
            .collect())
    }

    async fn list_changes(&self, token: Option<&str>) -> Result<RemoteChangeBatch, DavError> {
        let mut server = self.server();
        server.begin(Call::ListChanges(token.map(str::to_string)))?;

        let (base, offset) = match token {
            None => (0, 0),
            Some(token) => {
                let (base, offset) = parse_token(token).ok_or(DavError::TokenInvalid)?;
                if base < server.min_token {
                    return Err(DavError::TokenInvalid);
                }
                (base, offset)
            }
        };

        // `None` marks a removal.
        let entries: Vec<(String, Option<ETag>)> = if base == 0 {
            server
                .resources
                .iter()
                .map(|(name, r)| (name.clone(), Some(r.etag.clone())))
                .collect()
        } else {
            server
                .changes
                .iter()
                .filter(|(_, version)| **version > base)
                .map(|(name, _)| (name.clone(), server.resources.get(name).map(|r| r.etag.clone())))
                .collect()
        };

        let rest: Vec<_> = entries.into_iter().skip(offset).collect();
        let (page, has_more, next) = match server.page_size {
            Some(size) if rest.len() > size => (
                rest.into_iter().take(size).collect::<Vec<_>>(),
                true,
                format!("v{base}.{}", offset + size),
            ),
            _ => (rest, false, format!("v{}", server.version)),
        };

        let mut changed = Vec::new();
        let mut removed = Vec::new();
        for (name, etag) in page {
            match etag {
                Some(etag) => changed.push(RemoteEntry::new(name, Some(etag))),
                None => removed.push(name),
            }
        }
        Ok(RemoteChangeBatch {
            changed,
            removed,
            state: SyncState::sync_token(next, false),
            has_more,
        })
    }

    async fn fetch_batch(&self, names: &[String]) -> Result<Vec<RemoteResource>, DavError> {
        let mut server = self.server();
        server.begin(Call::FetchBatch(names.to_vec()))?;
        for name in std::mem::take(&mut server.remove_on_fetch) {
            if server.resources.remove(&name).is_some() {
                server.bump(&name);
            }
        }
        Ok(names
            .iter()
            .filter_map(|name| {
                let r = server.resources.get(name)?;
                let content_type = if r.data.starts_with("BEGIN:VCARD") {
                    RecordType::Contacts.content_type()
                } else {
                    RecordType::Events.content_type()
                };
                Some(RemoteResource {
                    name: name.clone(),
                    etag: Some(r.etag.clone()),
                    schedule_tag: r.schedule_tag.clone(),
                    body: Body {
                        bytes: r.data.clone().into_bytes(),
                        content_type: content_type.to_string(),
                    },
                })
            })
            .collect())
    }

    async fn put(
        &self,
        name: &str,
        body: Body,
        precondition: &Precondition,
    ) -> Result<PutResult, DavError> {
        let mut server = self.server();
        server.begin(Call::Put(name.to_string(), precondition.clone()))?;
        server.check(name, precondition)?;

        let data =
            String::from_utf8(body.bytes).map_err(|e| DavError::InvalidResponse(e.to_string()))?;
        let schedule_tag = server
            .resources
            .get(name)
            .and_then(|r| r.schedule_tag.clone());
        let etag = server.store(name, data, schedule_tag.clone());
        Ok(PutResult {
            etag: (!server.omit_put_etag).then_some(etag),
            schedule_tag,
        })
    }

    async fn delete(&self, name: &str, precondition: &Precondition) -> Result<(), DavError> {
        let mut server = self.server();
        server.begin(Call::Delete(name.to_string(), precondition.clone()))?;
        if !server.resources.contains_key(name) {
            return Err(DavError::NotFound(name.to_string()));
        }
        server.check(name, precondition)?;
        server.resources.remove(name);
        server.bump(name);
        Ok(())
    }
}
