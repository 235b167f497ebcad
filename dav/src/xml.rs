// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! XML utilities for WebDAV/CalDAV/CardDAV processing.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::DavError;

/// XML namespaces used in `WebDAV` and its extensions.
pub mod ns {
    /// `WebDAV` namespace.
    pub const DAV: &str = "DAV:";

    /// `CalDAV` namespace.
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";

    /// `CardDAV` namespace.
    pub const CARDDAV: &str = "urn:ietf:params:xml:ns:carddav";

    /// Apple calendar server extensions (`getctag`, proxy principals).
    pub const CALENDARSERVER: &str = "http://calendarserver.org/ns/";
}

pub(crate) type XmlWriter = Writer<Cursor<Vec<u8>>>;

pub(crate) fn writer() -> XmlWriter {
    Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2)
}

/// Writes `<name/>`.
pub(crate) fn write_empty(writer: &mut XmlWriter, name: &str) -> Result<(), DavError> {
    writer.write_event(Event::Empty(BytesStart::new(name)))?;
    Ok(())
}

/// Writes `<name>text</name>`.
pub(crate) fn write_text(writer: &mut XmlWriter, name: &str, text: &str) -> Result<(), DavError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub(crate) fn start(writer: &mut XmlWriter, elem: BytesStart<'_>) -> Result<(), DavError> {
    writer.write_event(Event::Start(elem))?;
    Ok(())
}

pub(crate) fn end(writer: &mut XmlWriter, name: &str) -> Result<(), DavError> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub(crate) fn finish(writer: XmlWriter) -> Result<String, DavError> {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))
}
