// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - A scripted remote collection recording every request
//! - An in-memory local store recording every write
//! - Record bodies and run wiring

mod fake_remote;
mod fixtures;

#[allow(unused_imports)]
pub use fake_remote::{Call, FakeRemote, Op};
#[allow(unused_imports)]
pub use fixtures::{Harness, event, vcard};
#[allow(unused_imports)]
pub use memory_store::{MemoryStore, Tags};
