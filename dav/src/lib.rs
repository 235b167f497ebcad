// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `WebDAV` client for synchronizing `CalDAV` (RFC 4791) and `CardDAV`
//! (RFC 6352) collections, including RFC 6578 collection synchronization.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
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
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

mod client;
mod config;
mod discovery;
mod error;
mod http;
mod request;
mod response;
mod types;
mod xml;

pub use crate::client::DavClient;
pub use crate::config::{AuthMethod, DavConfig};
pub use crate::error::DavError;
pub use crate::http::Precondition;
pub use crate::request::{
    CalendarQueryRequest, MultiGetKind, MultiGetRequest, Prop, PropFindRequest,
    SyncCollectionRequest, TimeRange,
};
pub use crate::response::{MultiStatusResponse, PropStat, Properties, ResponseItem, status_code};
pub use crate::types::{
    CollectionInfo, ETag, FetchedResource, HomeSets, Href, Member, PutResult, SyncCollectionPage,
};
