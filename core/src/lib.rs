// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Bidirectional synchronization of local record collections with `CalDAV`
//! and `CardDAV` servers.
//!
//! A [`SyncOrchestrator`] runs one collection: it pushes local deletions and
//! modifications, then pulls remote changes either by a full listing or
//! incrementally with RFC 6578 sync-tokens. Remote and local sides are
//! reached through the [`RemoteCollection`] and [`LocalStore`] traits;
//! [`DavCollection`] and [`LocalDb`] are the provided implementations.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod body;
mod classify;
mod config;
mod context;
mod dav_remote;
mod error;
mod gate;
mod local;
mod localdb;
mod orchestrator;
mod outcome;
mod pool;
mod pull;
mod push;
mod record_type;
mod remote;
mod state;

pub use crate::body::{Body, BodyBuilder, RawBodyBuilder, RawItem};
pub use crate::classify::{FatalReason, RemoteOp, Resolution, classify};
pub use crate::config::SyncConfig;
pub use crate::context::SyncContext;
pub use crate::dav_remote::DavCollection;
pub use crate::error::{BodyError, ErrorContext, StoreError, SyncError};
pub use crate::gate::{ConcurrencyGate, GateGuard, GateKey};
pub use crate::local::{Applied, LocalRecord, LocalStore, RecordId};
pub use crate::localdb::{CollectionStore, LocalDb};
pub use crate::orchestrator::SyncOrchestrator;
pub use crate::outcome::{SyncCounters, SyncOutcome, SyncStatus};
pub use crate::pool::{MAX_WORKERS, WorkerPool};
pub use crate::pull::{
    DOWNLOAD_BATCH_SIZE, FullListingSync, IncrementalSync, PendingDownloadQueue, Strategy,
};
pub use crate::push::LocalChangePusher;
pub use crate::record_type::RecordType;
pub use crate::remote::{
    RemoteChangeBatch, RemoteCollection, RemoteEntry, RemoteInfo, RemoteResource,
};
pub use crate::state::SyncState;
