// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Decides whether a failed remote request is retried, absorbed or fatal.

use std::time::Duration;

use davsync_dav::DavError;

/// The remote request that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    /// Capability/version query.
    Query,
    /// Full member listing.
    List,
    /// Incremental change listing.
    ListChanges,
    /// Batched download.
    Fetch,
    /// Upload; `update` is false for a "must not exist" upload.
    Put {
        /// Whether an existing resource was overwritten.
        update: bool,
    },
    /// Delete.
    Delete,
}

/// What to do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Abort this run; a later one may succeed.
    Retryable(Option<Duration>),
    /// Expected divergence: accept it and continue.
    Ignorable,
    /// Start over from a clean slate: re-upload as new, or list from scratch.
    RestartAsFresh,
    /// Abort this run and report.
    Fatal(FatalReason),
}

/// Why a failure is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalReason {
    /// Credentials must be fixed by the user.
    Authentication,
    /// Unexpected protocol outcome.
    Protocol,
}

/// Classifies the failure of `op`.
#[must_use]
pub fn classify(op: RemoteOp, err: &DavError) -> Resolution {
    use Resolution::{Fatal, Ignorable, RestartAsFresh, Retryable};

    match (op, err) {
        (_, DavError::Auth(_)) => Fatal(FatalReason::Authentication),
        (_, DavError::ServiceUnavailable { retry_after }) => Retryable(*retry_after),
        (_, e) if e.is_transient() => Retryable(None),

        (RemoteOp::ListChanges, DavError::TokenInvalid) => RestartAsFresh,

        (
            RemoteOp::Put { .. },
            DavError::Forbidden {
                need_privileges: true,
                ..
            }
            | DavError::Conflict(_)
            | DavError::PreconditionFailed(_),
        ) => Ignorable,
        (RemoteOp::Put { update: true }, DavError::NotFound(_) | DavError::Gone(_)) => {
            RestartAsFresh
        }

        // A delete is a local intent that wins once initiated.
        (
            RemoteOp::Delete,
            DavError::NotFound(_)
            | DavError::Gone(_)
            | DavError::Forbidden { .. }
            | DavError::Conflict(_)
            | DavError::PreconditionFailed(_)
            | DavError::Status { .. },
        ) => Ignorable,

        _ => Fatal(FatalReason::Protocol),
    }
}
