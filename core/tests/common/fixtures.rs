// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Record bodies and run wiring shared by the sync tests.

use davsync_core::{RawBodyBuilder, RecordType, SyncContext, WorkerPool};

use crate::common::{FakeRemote, MemoryStore};

/// An iCalendar object holding one event.
pub fn event(uid: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//davsync//test//EN\r\nBEGIN:VEVENT\r\n\
         UID:{uid}\r\nSUMMARY:{uid}\r\nDTSTART:20260301T090000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
    )
}

/// A vCard.
pub fn vcard(uid: &str) -> String {
    format!("BEGIN:VCARD\r\nVERSION:4.0\r\nUID:{uid}\r\nFN:{uid}\r\nEND:VCARD\r\n")
}

/// Collaborators of one run, borrowed by a [`SyncContext`].
pub struct Harness {
    pub remote: FakeRemote,
    pub store: MemoryStore,
    pub body: RawBodyBuilder,
    pub record_type: RecordType,
    pub pool: WorkerPool,
}

impl Harness {
    pub fn new(remote: FakeRemote, record_type: RecordType) -> Self {
        Self {
            remote,
            store: MemoryStore::new(record_type),
            body: RawBodyBuilder::new(record_type),
            record_type,
            pool: WorkerPool::new(2),
        }
    }

    pub fn events(remote: FakeRemote) -> Self {
        Self::new(remote, RecordType::Events)
    }

    pub fn context(&self) -> SyncContext<'_, FakeRemote, MemoryStore, RawBodyBuilder> {
        SyncContext::new(
            &self.remote,
            &self.store,
            &self.body,
            self.record_type,
            &self.pool,
        )
    }
}
