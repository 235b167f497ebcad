// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use davsync_dav::MultiGetKind;

/// Kind of records held by a collection.
///
/// Everything that differs between record kinds during a sync is answered
/// here, selected once per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// vCards in a `CardDAV` address book.
    Contacts,
    /// `VEVENT` components in a `CalDAV` calendar.
    Events,
    /// `VTODO` components in a `CalDAV` calendar.
    Tasks,
    /// `VJOURNAL` components in a `CalDAV` calendar.
    Journal,
}

impl RecordType {
    /// Content type sent with uploads.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Contacts => "text/vcard; charset=utf-8",
            Self::Events | Self::Tasks | Self::Journal => "text/calendar; charset=utf-8",
        }
    }

    /// File extension for generated resource names.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Contacts => "vcf",
            Self::Events | Self::Tasks | Self::Journal => "ics",
        }
    }

    /// Multiget report used to download bodies.
    #[must_use]
    pub const fn multiget_kind(self) -> MultiGetKind {
        match self {
            Self::Contacts => MultiGetKind::Addressbook,
            Self::Events | Self::Tasks | Self::Journal => MultiGetKind::Calendar,
        }
    }

    /// Calendar component name, `None` for contacts.
    #[must_use]
    pub const fn component(self) -> Option<&'static str> {
        match self {
            Self::Contacts => None,
            Self::Events => Some("VEVENT"),
            Self::Tasks => Some("VTODO"),
            Self::Journal => Some("VJOURNAL"),
        }
    }

    /// Line every valid body starts with.
    #[must_use]
    pub const fn begin_marker(self) -> &'static str {
        match self {
            Self::Contacts => "BEGIN:VCARD",
            Self::Events | Self::Tasks | Self::Journal => "BEGIN:VCALENDAR",
        }
    }

    /// Whether a past-days window limits what is listed.
    ///
    /// Only events are windowed; a windowed listing can't be resumed with a
    /// sync-token, so it forces the full-listing strategy.
    #[must_use]
    pub const fn supports_time_window(self) -> bool {
        matches!(self, Self::Events)
    }

    /// Whether the local store post-processes the collection after a pull.
    ///
    /// Contacts fix up group memberships that refer to cards by UID.
    #[must_use]
    pub const fn has_post_processing(self) -> bool {
        matches!(self, Self::Contacts)
    }

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Events => "events",
            Self::Tasks => "tasks",
            Self::Journal => "journal",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contacts" => Ok(Self::Contacts),
            "events" => Ok(Self::Events),
            "tasks" => Ok(Self::Tasks),
            "journal" => Ok(Self::Journal),
            _ => Err(format!("Unknown record type: {s}")),
        }
    }
}
