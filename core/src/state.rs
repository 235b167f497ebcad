// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// How far a local collection has caught up with its remote counterpart.
///
/// The value is opaque to callers and persisted per collection by the
/// [`LocalStore`](crate::LocalStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncState {
    /// Opaque collection version, usable for comparison only.
    #[serde(rename = "ctag")]
    CTag {
        /// The version value.
        value: String,
        /// Days of the listing window the version was pulled with, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window_days: Option<u32>,
    },

    /// RFC 6578 sync-token, usable to resume incremental listing.
    SyncToken {
        /// The token value.
        value: String,
        /// Whether an initial listing driven by this token is still being
        /// paginated. Remote absence must not delete local records yet.
        initial_sync_in_progress: bool,
    },
}

impl SyncState {
    /// Creates a comparison-only state.
    pub fn ctag(value: impl Into<String>) -> Self {
        Self::CTag {
            value: value.into(),
            window_days: None,
        }
    }

    /// Records the listing window a comparison-only state was pulled with.
    ///
    /// Sync-token states are returned unchanged.
    #[must_use]
    pub fn with_window(self, days: Option<u32>) -> Self {
        match self {
            Self::CTag { value, .. } => Self::CTag {
                value,
                window_days: days,
            },
            state @ Self::SyncToken { .. } => state,
        }
    }

    /// Creates a resumable state.
    pub fn sync_token(value: impl Into<String>, initial_sync_in_progress: bool) -> Self {
        Self::SyncToken {
            value: value.into(),
            initial_sync_in_progress,
        }
    }

    /// The sync-token to resume from, if this state carries one.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::SyncToken { value, .. } => Some(value),
            Self::CTag { .. } => None,
        }
    }

    /// Whether a token-based initial listing was interrupted.
    #[must_use]
    pub const fn is_initial_in_progress(&self) -> bool {
        matches!(
            self,
            Self::SyncToken {
                initial_sync_in_progress: true,
                ..
            }
        )
    }

    /// Whether a stored state proves the local copy already reflects
    /// `remote`, so no pull is needed.
    ///
    /// An interrupted initial listing never matches, nor does a version
    /// pulled with another listing window.
    #[must_use]
    pub fn matches(&self, remote: &Self) -> bool {
        match (self, remote) {
            (
                Self::CTag {
                    value: a,
                    window_days: wa,
                },
                Self::CTag {
                    value: b,
                    window_days: wb,
                },
            ) => a == b && wa == wb,
            (
                Self::SyncToken {
                    value: a,
                    initial_sync_in_progress: false,
                },
                Self::SyncToken { value: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}
