// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line front end of davsync.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_debug_implementations,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::pedantic
)]
#![allow(clippy::missing_errors_doc)]

mod cli;
mod cmd_discover;
mod cmd_sync;
mod config;

pub use crate::cli::{Cli, Commands, run};
pub use crate::config::{CollectionConfig, Config};
