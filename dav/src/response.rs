// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Response parsers for `WebDAV` multistatus bodies.

use std::mem;

use quick_xml::events::{BytesStart, Event};

use crate::error::DavError;
use crate::types::{CollectionInfo, ETag, FetchedResource, Href, Member, SyncCollectionPage};

/// `WebDAV` multistatus response.
#[derive(Debug, Clone, Default)]
pub struct MultiStatusResponse {
    /// The response items.
    pub responses: Vec<ResponseItem>,
    /// Top-level `sync-token`, present on `sync-collection` results.
    pub sync_token: Option<String>,
}

/// Individual response in multistatus.
#[derive(Debug, Clone, Default)]
pub struct ResponseItem {
    /// The href the response describes.
    pub href: Href,
    /// Property groups, one per status.
    pub prop_stats: Vec<PropStat>,
    /// Response-level status line, used instead of propstats for removed
    /// members and truncation markers.
    pub status: Option<String>,
}

/// Property stat with status and value.
#[derive(Debug, Clone, Default)]
pub struct PropStat {
    /// The properties reported under this status.
    pub props: Properties,
    /// The raw status line, e.g. `HTTP/1.1 200 OK`.
    pub status: String,
}

/// WebDAV/CalDAV/CardDAV properties.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    /// `DAV:displayname`.
    pub display_name: Option<String>,
    /// `DAV:getetag`.
    pub get_etag: Option<ETag>,
    /// `CALDAV:schedule-tag`.
    pub schedule_tag: Option<ETag>,
    /// `CS:getctag`.
    pub get_ctag: Option<String>,
    /// `DAV:sync-token` requested as a property.
    pub sync_token: Option<String>,
    /// `CALDAV:calendar-data`.
    pub calendar_data: Option<String>,
    /// `CARDDAV:address-data`.
    pub address_data: Option<String>,
    /// Reports listed in `DAV:supported-report-set`.
    pub supported_reports: Vec<String>,
    /// `DAV:current-user-principal`.
    pub current_user_principal: Option<Href>,
    /// `CALDAV:calendar-home-set`.
    pub calendar_home_set: Vec<Href>,
    /// `CARDDAV:addressbook-home-set`.
    pub addressbook_home_set: Vec<Href>,
    /// `CS:calendar-proxy-read-for` and `CS:calendar-proxy-write-for`.
    pub proxy_for: Vec<Href>,
    /// `DAV:group-membership`.
    pub group_membership: Vec<Href>,
    /// `DAV:collection` appears in the resource type.
    pub is_collection: bool,
    /// `CALDAV:calendar` appears in the resource type.
    pub is_calendar: bool,
    /// `CARDDAV:addressbook` appears in the resource type.
    pub is_addressbook: bool,
}

/// Parses the numeric code out of a status line such as `HTTP/1.1 404 Not Found`.
#[must_use]
pub fn status_code(status: &str) -> Option<u16> {
    status.split_whitespace().nth(1)?.parse().ok()
}

impl PropStat {
    /// Whether the properties in this group were found.
    #[must_use]
    pub fn is_success(&self) -> bool {
        status_code(&self.status).is_some_and(|code| (200..300).contains(&code))
    }
}

impl ResponseItem {
    /// The response-level status code, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.status.as_deref().and_then(status_code)
    }

    /// Properties from successful propstats, merged in document order.
    #[must_use]
    pub fn found_props(&self) -> Properties {
        let mut merged = Properties::default();
        for prop_stat in self.prop_stats.iter().filter(|p| p.is_success()) {
            merged.merge(prop_stat.props.clone());
        }
        merged
    }
}

impl Properties {
    fn merge(&mut self, other: Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            display_name,
            get_etag,
            schedule_tag,
            get_ctag,
            sync_token,
            calendar_data,
            address_data,
            current_user_principal
        );
        self.supported_reports.extend(other.supported_reports);
        self.calendar_home_set.extend(other.calendar_home_set);
        self.addressbook_home_set.extend(other.addressbook_home_set);
        self.proxy_for.extend(other.proxy_for);
        self.group_membership.extend(other.group_membership);
        self.is_collection |= other.is_collection;
        self.is_calendar |= other.is_calendar;
        self.is_addressbook |= other.is_addressbook;
    }
}

/// Elements whose `DAV:href` children are collected into a list.
const HREF_LISTS: &[&[u8]] = &[
    b"current-user-principal",
    b"calendar-home-set",
    b"addressbook-home-set",
    b"calendar-proxy-read-for",
    b"calendar-proxy-write-for",
    b"group-membership",
];

#[derive(Default)]
struct Parser {
    stack: Vec<Vec<u8>>,
    text: String,
    responses: Vec<ResponseItem>,
    sync_token: Option<String>,
    response: Option<ResponseItem>,
    prop_stat: Option<PropStat>,
}

impl Parser {
    fn parent_is(&self, name: &[u8]) -> bool {
        self.stack.last().is_some_and(|n| n == name)
    }

    fn within(&self, name: &[u8]) -> bool {
        self.stack.iter().any(|n| n == name)
    }

    fn props(&mut self) -> Option<&mut Properties> {
        self.prop_stat.as_mut().map(|p| &mut p.props)
    }

    fn open(&mut self, name: &[u8]) {
        match name {
            b"response" => self.response = Some(ResponseItem::default()),
            b"propstat" if self.response.is_some() => self.prop_stat = Some(PropStat::default()),
            _ => {}
        }

        if self.parent_is(b"resourcetype") {
            if let Some(props) = self.props() {
                match name {
                    b"collection" => props.is_collection = true,
                    b"calendar" => props.is_calendar = true,
                    b"addressbook" => props.is_addressbook = true,
                    _ => {}
                }
            }
        } else if self.parent_is(b"report") && self.within(b"supported-report-set") {
            let report = String::from_utf8_lossy(name).into_owned();
            if let Some(props) = self.props() {
                props.supported_reports.push(report);
            }
        }
    }

    fn close(&mut self, name: &[u8]) {
        let text = mem::take(&mut self.text).trim().to_string();
        let parent = self.stack.last().cloned();

        match name {
            b"href" => match parent.as_deref() {
                Some(b"response") => {
                    if let Some(resp) = self.response.as_mut() {
                        resp.href = Href::new(text);
                    }
                }
                Some(list) if HREF_LISTS.contains(&list) => {
                    let list = list.to_vec();
                    if let Some(props) = self.props() {
                        let target = match list.as_slice() {
                            b"current-user-principal" => {
                                props.current_user_principal = Some(Href::new(text));
                                return;
                            }
                            b"calendar-home-set" => &mut props.calendar_home_set,
                            b"addressbook-home-set" => &mut props.addressbook_home_set,
                            b"group-membership" => &mut props.group_membership,
                            _ => &mut props.proxy_for,
                        };
                        target.push(Href::new(text));
                    }
                }
                _ => {}
            },
            b"status" => match parent.as_deref() {
                Some(b"propstat") => {
                    if let Some(prop_stat) = self.prop_stat.as_mut() {
                        prop_stat.status = text;
                    }
                }
                Some(b"response") => {
                    if let Some(resp) = self.response.as_mut() {
                        resp.status = Some(text);
                    }
                }
                _ => {}
            },
            b"sync-token" if matches!(parent.as_deref(), Some(b"multistatus")) => {
                self.sync_token = Some(text);
            }
            b"propstat" => {
                if let (Some(prop_stat), Some(resp)) =
                    (self.prop_stat.take(), self.response.as_mut())
                {
                    resp.prop_stats.push(prop_stat);
                }
            }
            b"response" => {
                if let Some(resp) = self.response.take() {
                    self.responses.push(resp);
                }
            }
            _ if matches!(parent.as_deref(), Some(b"prop")) => {
                let Some(props) = self.props() else { return };
                match name {
                    b"displayname" => props.display_name = Some(text),
                    b"getetag" if !text.is_empty() => props.get_etag = Some(ETag::new(text)),
                    b"schedule-tag" if !text.is_empty() => {
                        props.schedule_tag = Some(ETag::new(text));
                    }
                    b"getctag" => props.get_ctag = Some(text),
                    b"sync-token" => props.sync_token = Some(text),
                    b"calendar-data" => props.calendar_data = Some(text),
                    b"address-data" => props.address_data = Some(text),
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

fn local_name(e: &BytesStart<'_>) -> Vec<u8> {
    e.name().local_name().into_inner().to_vec()
}

impl MultiStatusResponse {
    /// Parses multistatus response from XML.
    ///
    /// Elements are matched by local name so any namespace prefix works.
    ///
    /// # Errors
    ///
    /// Returns an error if XML parsing fails.
    pub fn from_xml(xml: &str) -> Result<Self, DavError> {
        let mut reader = quick_xml::Reader::from_str(xml);
        // Text is trimmed per element instead: entity references split text
        // into several events and trimming each piece would eat spaces.
        reader.config_mut().trim_text(false);
        reader.config_mut().check_end_names = true;

        let mut parser = Parser::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let name = local_name(e);
                    parser.open(&name);
                    parser.stack.push(name);
                    parser.text.clear();
                }
                Event::Empty(ref e) => {
                    let name = local_name(e);
                    parser.open(&name);
                    parser.close(&name);
                }
                Event::Text(ref t) => {
                    let text = t
                        .decode()
                        .map_err(|e| DavError::Xml(format!("invalid text: {e}")))?;
                    parser.text.push_str(&text);
                }
                Event::CData(t) => {
                    parser.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
                Event::GeneralRef(ref r) => {
                    let name = r
                        .decode()
                        .map_err(|e| DavError::Xml(format!("invalid reference: {e}")))?;
                    if let Some(ch) = r
                        .resolve_char_ref()
                        .map_err(|e| DavError::Xml(format!("invalid reference: {e}")))?
                    {
                        parser.text.push(ch);
                    } else if let Some(value) = quick_xml::escape::resolve_predefined_entity(&name)
                    {
                        parser.text.push_str(value);
                    }
                }
                Event::End(ref e) => {
                    let name = e.name().local_name().into_inner().to_vec();
                    parser.stack.pop();
                    parser.close(&name);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self {
            responses: parser.responses,
            sync_token: parser.sync_token,
        })
    }

    /// Extracts collection metadata from a depth-0 PROPFIND response.
    #[must_use]
    pub fn into_collection_info(self) -> CollectionInfo {
        let mut info = CollectionInfo::default();
        for response in &self.responses {
            let props = response.found_props();
            info.display_name = info.display_name.or(props.display_name);
            info.ctag = info.ctag.or(props.get_ctag);
            info.sync_token = info.sync_token.or(props.sync_token);
            info.supports_sync_collection |= props
                .supported_reports
                .iter()
                .any(|r| r == "sync-collection");
        }
        info
    }

    /// Extracts non-collection members from a depth-1 listing.
    ///
    /// The collection itself and any sub-collections are skipped.
    #[must_use]
    pub fn into_members(self, collection: &Href) -> Vec<Member> {
        self.responses
            .into_iter()
            .filter(|r| !r.href.same_path(collection))
            .filter_map(|r| {
                let props = r.found_props();
                if props.is_collection {
                    return None;
                }
                Some(Member {
                    href: r.href,
                    etag: props.get_etag,
                })
            })
            .collect()
    }

    /// Splits a `sync-collection` response into changed and removed members.
    #[must_use]
    pub fn into_sync_page(self, collection: &Href) -> SyncCollectionPage {
        let mut page = SyncCollectionPage {
            sync_token: self.sync_token,
            ..Default::default()
        };

        for response in self.responses {
            let code = response.status_code();
            if response.href.same_path(collection) {
                if code == Some(507) {
                    page.truncated = true;
                }
                continue;
            }
            if code == Some(404) {
                page.removed.push(response.href);
                continue;
            }
            let props = response.found_props();
            if props.is_collection {
                continue;
            }
            page.changed.push(Member {
                href: response.href,
                etag: props.get_etag,
            });
        }

        page
    }

    /// Extracts resource bodies from a multiget response.
    ///
    /// Members the server could not return (no data, non-2xx) are dropped;
    /// callers compare the result against the requested hrefs.
    #[must_use]
    pub fn into_resources(self) -> Vec<FetchedResource> {
        self.responses
            .into_iter()
            .filter_map(|r| {
                let props = r.found_props();
                let data = props.calendar_data.or(props.address_data)?;
                Some(FetchedResource {
                    href: r.href,
                    etag: props.get_etag,
                    schedule_tag: props.schedule_tag,
                    data,
                })
            })
            .collect()
    }
}
