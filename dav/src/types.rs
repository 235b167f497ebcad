// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::ops::Deref;

/// Resource href (path).
///
/// A `Href` represents the path to a resource or collection on a `WebDAV`
/// server, such as `/calendars/user/work/event1.ics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Href(String);

impl Href {
    /// Creates a new `Href` from a string.
    #[must_use]
    pub const fn new(href: String) -> Self {
        Self(href)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last non-empty path segment, ignoring a trailing slash.
    ///
    /// Absolute URLs are accepted as well as absolute paths.
    #[must_use]
    pub fn last_segment(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Resolves a member name against this collection href.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        if self.0.ends_with('/') {
            Self(format!("{}{name}", self.0))
        } else {
            Self(format!("{}/{name}", self.0))
        }
    }

    /// Whether both hrefs point at the same path, ignoring scheme/host and
    /// a trailing slash.
    #[must_use]
    pub fn same_path(&self, other: &Self) -> bool {
        strip_origin(&self.0).trim_end_matches('/') == strip_origin(&other.0).trim_end_matches('/')
    }
}

fn strip_origin(href: &str) -> &str {
    match href.split_once("://") {
        Some((_, rest)) => rest.find('/').and_then(|i| rest.get(i..)).unwrap_or("/"),
        None => href,
    }
}

impl Deref for Href {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Href {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Href {
    fn from(href: String) -> Self {
        Self(href)
    }
}

impl From<&str> for Href {
    fn from(href: &str) -> Self {
        Self(href.to_string())
    }
}

/// Entity tag for change detection.
///
/// Used both for `ETag` and `Schedule-Tag` values, which share the same
/// opaque quoted-string syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag(String);

impl ETag {
    /// Creates a new `ETag` from a string.
    #[must_use]
    pub const fn new(etag: String) -> Self {
        Self(etag)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a weak validator (`W/"..."`).
    ///
    /// Weak tags can't be used for `If-Match`, so callers treat them as absent.
    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.0.starts_with("W/")
    }
}

impl Deref for ETag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ETag {
    fn from(etag: String) -> Self {
        Self(etag)
    }
}

impl From<&str> for ETag {
    fn from(etag: &str) -> Self {
        Self(etag.to_string())
    }
}

/// Collection-level metadata returned by a depth-0 PROPFIND.
#[derive(Debug, Clone, Default)]
pub struct CollectionInfo {
    /// The display name of the collection.
    pub display_name: Option<String>,
    /// The collection tag (`CTag`), a comparison-only version token.
    pub ctag: Option<String>,
    /// The RFC 6578 sync-token, if the server exposes one.
    pub sync_token: Option<String>,
    /// Whether the server advertises the `sync-collection` report.
    pub supports_sync_collection: bool,
}

/// A collection member as seen in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The href of the member.
    pub href: Href,
    /// The entity tag of the member, if the server reported one.
    pub etag: Option<ETag>,
}

/// One page of an RFC 6578 `sync-collection` report.
#[derive(Debug, Clone, Default)]
pub struct SyncCollectionPage {
    /// The token to use for the next request.
    pub sync_token: Option<String>,
    /// Members added or modified since the requested token.
    pub changed: Vec<Member>,
    /// Members removed since the requested token.
    pub removed: Vec<Href>,
    /// Whether the server truncated the result (HTTP 507 on the collection).
    pub truncated: bool,
}

/// A resource body retrieved with a multiget report.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// The href of the resource.
    pub href: Href,
    /// The entity tag of the resource.
    pub etag: Option<ETag>,
    /// The schedule tag of the resource (RFC 6638).
    pub schedule_tag: Option<ETag>,
    /// The raw `calendar-data` or `address-data` payload.
    pub data: String,
}

/// Tags returned by a successful PUT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutResult {
    /// The new strong `ETag`, if the server returned one.
    pub etag: Option<ETag>,
    /// The new `Schedule-Tag`, if the server returned one.
    pub schedule_tag: Option<ETag>,
}

/// Home sets collected by principal discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeSets {
    /// `CalDAV` calendar home sets, in discovery order.
    pub calendar_homes: Vec<Href>,
    /// `CardDAV` address book home sets, in discovery order.
    pub addressbook_homes: Vec<Href>,
    /// Every principal that was visited.
    pub principals: Vec<Href>,
}
