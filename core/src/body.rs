// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::BodyError;
use crate::record_type::RecordType;

/// A serialized record as exchanged with the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    /// Serialized bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub content_type: String,
}

/// Converts between local domain objects and upload/download bodies.
pub trait BodyBuilder: Send + Sync {
    /// Domain object handled by this builder.
    type Item;

    /// Serializes a record for upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the record can't be serialized.
    fn build(&self, item: &Self::Item) -> Result<Body, BodyError>;

    /// Parses a downloaded body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed.
    fn parse(&self, body: &Body) -> Result<Self::Item, BodyError>;
}

/// A record kept as its raw iCalendar or vCard text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    /// The `UID` property, if present.
    pub uid: Option<String>,
    /// The raw text.
    pub data: String,
}

impl RawItem {
    /// Wraps raw text, extracting its `UID`.
    pub fn new(data: impl Into<String>) -> Self {
        let data = data.into();
        Self {
            uid: find_uid(&data),
            data,
        }
    }
}

/// [`BodyBuilder`] that stores bodies verbatim after a sanity check.
#[derive(Debug, Clone, Copy)]
pub struct RawBodyBuilder {
    record_type: RecordType,
}

impl RawBodyBuilder {
    /// Creates a builder for the given record type.
    #[must_use]
    pub const fn new(record_type: RecordType) -> Self {
        Self { record_type }
    }
}

impl BodyBuilder for RawBodyBuilder {
    type Item = RawItem;

    fn build(&self, item: &RawItem) -> Result<Body, BodyError> {
        check_begin(&item.data, self.record_type.begin_marker())?;
        Ok(Body {
            bytes: item.data.clone().into_bytes(),
            content_type: self.record_type.content_type().to_string(),
        })
    }

    fn parse(&self, body: &Body) -> Result<RawItem, BodyError> {
        let data = std::str::from_utf8(&body.bytes).map_err(|_| BodyError::Encoding)?;
        check_begin(data, self.record_type.begin_marker())?;
        Ok(RawItem::new(data))
    }
}

fn check_begin(data: &str, expected: &'static str) -> Result<(), BodyError> {
    let first = data
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or(BodyError::Empty)?;

    if first.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(BodyError::UnexpectedContent {
            expected,
            found: first.to_string(),
        })
    }
}

/// Finds the first `UID` property, ignoring parameters and folding.
fn find_uid(data: &str) -> Option<String> {
    data.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        let name = name.split(';').next()?.trim();
        let value = value.trim();
        (name.eq_ignore_ascii_case("UID") && !value.is_empty()).then(|| value.to_string())
    })
}
