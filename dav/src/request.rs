// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request builders for `WebDAV` operations.

use quick_xml::events::BytesStart;

use crate::error::DavError;
use crate::xml::{self, XmlWriter, ns};

/// Properties to request in PROPFIND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prop {
    /// Display name.
    DisplayName,
    /// Resource type.
    ResourceType,
    /// `ETag`.
    GetETag,
    /// Collection tag (calendarserver extension).
    GetCTag,
    /// RFC 6578 sync-token.
    SyncToken,
    /// Supported REPORT methods.
    SupportedReportSet,
    /// Current user principal.
    CurrentUserPrincipal,
    /// Calendar home set.
    CalendarHomeSet,
    /// Address book home set.
    AddressbookHomeSet,
    /// Principals this principal may read as a calendar proxy.
    CalendarProxyReadFor,
    /// Principals this principal may write as a calendar proxy.
    CalendarProxyWriteFor,
    /// Groups this principal is a member of.
    GroupMembership,
}

impl Prop {
    /// Returns the qualified element name using the builder's prefixes.
    const fn qualified(self) -> &'static str {
        match self {
            Self::DisplayName => "D:displayname",
            Self::ResourceType => "D:resourcetype",
            Self::GetETag => "D:getetag",
            Self::GetCTag => "CS:getctag",
            Self::SyncToken => "D:sync-token",
            Self::SupportedReportSet => "D:supported-report-set",
            Self::CurrentUserPrincipal => "D:current-user-principal",
            Self::CalendarHomeSet => "C:calendar-home-set",
            Self::AddressbookHomeSet => "A:addressbook-home-set",
            Self::CalendarProxyReadFor => "CS:calendar-proxy-read-for",
            Self::CalendarProxyWriteFor => "CS:calendar-proxy-write-for",
            Self::GroupMembership => "D:group-membership",
        }
    }
}

/// PROPFIND request builder.
#[derive(Debug, Default)]
pub struct PropFindRequest {
    props: Vec<Prop>,
}

impl PropFindRequest {
    /// Creates a new PROPFIND request.
    #[must_use]
    pub fn new() -> Self {
        Self { props: Vec::new() }
    }

    /// Adds a property to the request.
    pub fn add_property(&mut self, prop: Prop) -> &mut Self {
        if !self.props.contains(&prop) {
            self.props.push(prop);
        }
        self
    }

    /// Builds the XML body for the PROPFIND request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = xml::writer();

        let mut propfind = BytesStart::new("D:propfind");
        push_namespaces(&mut propfind);
        xml::start(&mut writer, propfind)?;

        xml::start(&mut writer, BytesStart::new("D:prop"))?;
        for prop in &self.props {
            xml::write_empty(&mut writer, prop.qualified())?;
        }
        xml::end(&mut writer, "D:prop")?;

        xml::end(&mut writer, "D:propfind")?;
        xml::finish(writer)
    }
}

/// Time range filter for calendar queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    /// Start date/time in UTC basic format, e.g. `20260101T000000Z`.
    pub start: String,
    /// End date/time, open-ended if absent.
    pub end: Option<String>,
}

/// Calendar query request builder.
///
/// Only entity tags are requested: the bodies are fetched separately with a
/// multiget so a listing stays cheap.
#[derive(Debug, Default)]
pub struct CalendarQueryRequest {
    component: Option<String>,
    time_range: Option<TimeRange>,
}

impl CalendarQueryRequest {
    /// Creates a new calendar query request.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            component: None,
            time_range: None,
        }
    }

    /// Sets the component filter (VEVENT, VTODO, etc.).
    #[must_use]
    pub fn component(mut self, component: String) -> Self {
        self.component = Some(component);
        self
    }

    /// Sets the time range filter.
    #[must_use]
    pub fn time_range(mut self, start: String, end: Option<String>) -> Self {
        self.time_range = Some(TimeRange { start, end });
        self
    }

    /// Builds the XML body for the calendar query request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = xml::writer();

        let mut query = BytesStart::new("C:calendar-query");
        query.push_attribute(("xmlns:D", ns::DAV));
        query.push_attribute(("xmlns:C", ns::CALDAV));
        xml::start(&mut writer, query)?;

        xml::start(&mut writer, BytesStart::new("D:prop"))?;
        xml::write_empty(&mut writer, "D:getetag")?;
        xml::end(&mut writer, "D:prop")?;

        xml::start(&mut writer, BytesStart::new("C:filter"))?;
        let mut vcalendar = BytesStart::new("C:comp-filter");
        vcalendar.push_attribute(("name", "VCALENDAR"));
        xml::start(&mut writer, vcalendar)?;

        if let Some(component) = &self.component {
            let mut comp = BytesStart::new("C:comp-filter");
            comp.push_attribute(("name", component.as_str()));
            xml::start(&mut writer, comp)?;
            if let Some(tr) = &self.time_range {
                write_time_range(&mut writer, tr)?;
            }
            xml::end(&mut writer, "C:comp-filter")?;
        }

        xml::end(&mut writer, "C:comp-filter")?;
        xml::end(&mut writer, "C:filter")?;
        xml::end(&mut writer, "C:calendar-query")?;
        xml::finish(writer)
    }
}

fn write_time_range(writer: &mut XmlWriter, tr: &TimeRange) -> Result<(), DavError> {
    let mut time_range = BytesStart::new("C:time-range");
    time_range.push_attribute(("start", tr.start.as_str()));
    if let Some(end) = &tr.end {
        time_range.push_attribute(("end", end.as_str()));
    }
    writer.write_event(quick_xml::events::Event::Empty(time_range))?;
    Ok(())
}

/// Flavour of a multiget report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiGetKind {
    /// `CalDAV` `calendar-multiget` returning `calendar-data`.
    Calendar,
    /// `CardDAV` `addressbook-multiget` returning `address-data`.
    Addressbook,
}

/// Multiget request builder.
#[derive(Debug)]
pub struct MultiGetRequest {
    kind: MultiGetKind,
    hrefs: Vec<String>,
}

impl MultiGetRequest {
    /// Creates a new multiget request.
    #[must_use]
    pub const fn new(kind: MultiGetKind) -> Self {
        Self {
            kind,
            hrefs: Vec::new(),
        }
    }

    /// Adds an href to the request.
    pub fn add_href(&mut self, href: String) -> &mut Self {
        self.hrefs.push(href);
        self
    }

    /// Builds the XML body for the multiget request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = xml::writer();

        let (root, data) = match self.kind {
            MultiGetKind::Calendar => ("C:calendar-multiget", "C:calendar-data"),
            MultiGetKind::Addressbook => ("A:addressbook-multiget", "A:address-data"),
        };

        let mut multiget = BytesStart::new(root);
        multiget.push_attribute(("xmlns:D", ns::DAV));
        match self.kind {
            MultiGetKind::Calendar => multiget.push_attribute(("xmlns:C", ns::CALDAV)),
            MultiGetKind::Addressbook => multiget.push_attribute(("xmlns:A", ns::CARDDAV)),
        }
        xml::start(&mut writer, multiget)?;

        xml::start(&mut writer, BytesStart::new("D:prop"))?;
        xml::write_empty(&mut writer, "D:getetag")?;
        if self.kind == MultiGetKind::Calendar {
            xml::write_empty(&mut writer, "C:schedule-tag")?;
        }
        xml::write_empty(&mut writer, data)?;
        xml::end(&mut writer, "D:prop")?;

        for href in &self.hrefs {
            xml::write_text(&mut writer, "D:href", href)?;
        }

        xml::end(&mut writer, root)?;
        xml::finish(writer)
    }
}

/// RFC 6578 `sync-collection` request builder.
#[derive(Debug, Default)]
pub struct SyncCollectionRequest {
    sync_token: Option<String>,
    limit: Option<u32>,
}

impl SyncCollectionRequest {
    /// Creates a request; `None` asks for an initial listing.
    #[must_use]
    pub const fn new(sync_token: Option<String>) -> Self {
        Self {
            sync_token,
            limit: None,
        }
    }

    /// Asks the server to return at most `limit` results per page.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Builds the XML body for the sync-collection report.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = xml::writer();

        let mut root = BytesStart::new("D:sync-collection");
        root.push_attribute(("xmlns:D", ns::DAV));
        xml::start(&mut writer, root)?;

        xml::write_text(
            &mut writer,
            "D:sync-token",
            self.sync_token.as_deref().unwrap_or_default(),
        )?;
        xml::write_text(&mut writer, "D:sync-level", "1")?;

        if let Some(limit) = self.limit {
            xml::start(&mut writer, BytesStart::new("D:limit"))?;
            xml::write_text(&mut writer, "D:nresults", &limit.to_string())?;
            xml::end(&mut writer, "D:limit")?;
        }

        xml::start(&mut writer, BytesStart::new("D:prop"))?;
        xml::write_empty(&mut writer, "D:getetag")?;
        xml::end(&mut writer, "D:prop")?;

        xml::end(&mut writer, "D:sync-collection")?;
        xml::finish(writer)
    }
}

fn push_namespaces(elem: &mut BytesStart<'_>) {
    elem.push_attribute(("xmlns:D", ns::DAV));
    elem.push_attribute(("xmlns:C", ns::CALDAV));
    elem.push_attribute(("xmlns:A", ns::CARDDAV));
    elem.push_attribute(("xmlns:CS", ns::CALENDARSERVER));
}
