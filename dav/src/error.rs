// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// `WebDAV` client errors.
///
/// Status-bearing variants are split finely enough for callers to decide
/// between retrying, absorbing a conflict and failing.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DavError {
    /// Connection, timeout or other transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Request could not be built.
    #[error("HTTP error: {0}")]
    Http(String),

    /// XML parsing/writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Authentication error (HTTP 401).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Access denied (HTTP 403).
    #[error("Forbidden: {url}")]
    Forbidden {
        /// The requested URL.
        url: String,
        /// Whether the server reported a `DAV:need-privileges` precondition.
        need_privileges: bool,
    },

    /// Resource not found (HTTP 404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource gone (HTTP 410).
    #[error("Resource gone: {0}")]
    Gone(String),

    /// Conflict (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Precondition failed (HTTP 412, `ETag` mismatch).
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The sync-token sent with a `sync-collection` report was rejected.
    #[error("Sync token rejected by server")]
    TokenInvalid,

    /// Service unavailable (HTTP 503), optionally with a `Retry-After` hint.
    #[error("Service unavailable (retry after {retry_after:?})")]
    ServiceUnavailable {
        /// Delay requested by the server.
        retry_after: Option<Duration>,
    },

    /// Any other 5xx status.
    #[error("Server error: HTTP {status}")]
    Server {
        /// The HTTP status code.
        status: u16,
    },

    /// Unexpected non-success status.
    #[error("Unexpected status {status}: {message}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// Invalid response from server.
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DavError {
    /// Whether a later attempt may succeed without any change on our side.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::ServiceUnavailable { .. } | Self::Server { .. }
        )
    }

    /// Whether the error means the resource does not exist (404 or 410).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Gone(_))
    }
}

impl From<reqwest::Error> for DavError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::Http(e.to_string())
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<quick_xml::Error> for DavError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<std::io::Error> for DavError {
    fn from(e: std::io::Error) -> Self {
        Self::Xml(format!("IO error: {e}"))
    }
}
