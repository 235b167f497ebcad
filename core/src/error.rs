// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::time::Duration;

use davsync_dav::DavError;

use crate::classify::{FatalReason, Resolution};
use crate::local::RecordId;

/// Which local record and remote resource an error concerns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The local record involved, if any.
    pub record: Option<RecordId>,
    /// The remote address involved, if any.
    pub remote: Option<String>,
}

impl ErrorContext {
    /// Context naming a remote address only.
    pub fn remote(remote: impl Into<String>) -> Self {
        Self {
            record: None,
            remote: Some(remote.into()),
        }
    }

    /// Context naming a local record only.
    #[must_use]
    pub const fn record(record: RecordId) -> Self {
        Self {
            record: Some(record),
            remote: None,
        }
    }

    /// Adds the remote address.
    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = Some(remote.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.record, &self.remote) {
            (Some(record), Some(remote)) => write!(f, " (record {record}, {remote})"),
            (Some(record), None) => write!(f, " (record {record})"),
            (None, Some(remote)) => write!(f, " ({remote})"),
            (None, None) => Ok(()),
        }
    }
}

/// Failure of a synchronization run.
///
/// Conflicts the protocol resolves by itself never show up here; they turn
/// into state transitions where they occur.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The network or server is temporarily unavailable; retry later.
    #[error("Transient failure{context}: {source}")]
    Transient {
        /// The transport error.
        source: DavError,
        /// Delay suggested by the server.
        retry_after: Option<Duration>,
        /// What was being synchronized.
        context: ErrorContext,
    },

    /// The server rejected the credentials.
    #[error("Authentication required{context}: {source}")]
    Auth {
        /// The transport error.
        source: DavError,
        /// What was being synchronized.
        context: ErrorContext,
    },

    /// The local record store failed.
    #[error("Local store error{context}: {source}")]
    Store {
        /// The store error.
        source: StoreError,
        /// What was being synchronized.
        context: ErrorContext,
    },

    /// Unclassified remote failure.
    #[error("Remote error{context}: {source}")]
    Remote {
        /// The transport error.
        source: DavError,
        /// What was being synchronized.
        context: ErrorContext,
    },

    /// A local record could not be serialized for upload.
    #[error("Body error{context}: {source}")]
    Body {
        /// The serialization error.
        source: BodyError,
        /// What was being synchronized.
        context: ErrorContext,
    },

    /// The run was cancelled before it finished.
    #[error("Synchronization cancelled")]
    Cancelled,
}

impl SyncError {
    /// Escalates a remote error the classifier did not absorb.
    pub(crate) fn escalate(source: DavError, resolution: Resolution, context: ErrorContext) -> Self {
        match resolution {
            Resolution::Retryable(retry_after) => Self::Transient {
                source,
                retry_after,
                context,
            },
            Resolution::Fatal(FatalReason::Authentication) => Self::Auth { source, context },
            Resolution::Fatal(FatalReason::Protocol)
            | Resolution::Ignorable
            | Resolution::RestartAsFresh => Self::Remote { source, context },
        }
    }

    pub(crate) const fn store(source: StoreError, context: ErrorContext) -> Self {
        Self::Store { source, context }
    }

    /// Whether a later run may succeed without user action.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether the user has to fix the credentials.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Diagnostic context, if the error concerns a specific resource.
    #[must_use]
    pub const fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Transient { context, .. }
            | Self::Auth { context, .. }
            | Self::Store { context, .. }
            | Self::Remote { context, .. }
            | Self::Body { context, .. } => Some(context),
            Self::Cancelled => None,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(source: StoreError) -> Self {
        Self::store(source, ErrorContext::default())
    }
}

/// Local record store errors.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The record does not exist.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// A persisted sync state could not be read or written.
    #[error("Invalid sync state: {0}")]
    State(#[from] serde_json::Error),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// Record body (de)serialization errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    /// The body is not valid UTF-8.
    #[error("Body is not valid UTF-8")]
    Encoding,

    /// The body is not the expected kind of object.
    #[error("Expected {expected}, found {found:?}")]
    UnexpectedContent {
        /// The expected first line.
        expected: &'static str,
        /// The first line found.
        found: String,
    },

    /// The body is empty.
    #[error("Body is empty")]
    Empty,
}
