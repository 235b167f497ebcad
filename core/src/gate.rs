// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identifies what at most one run may synchronize at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GateKey {
    /// Account identity.
    pub account: String,
    /// Collection authority, e.g. the record type or collection URL.
    pub authority: String,
}

impl GateKey {
    /// Creates a key.
    pub fn new(account: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            authority: authority.into(),
        }
    }
}

impl fmt::Display for GateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.authority)
    }
}

/// Set of keys with a run in progress.
///
/// Entering an active key fails immediately instead of waiting: the newer
/// trigger is re-evaluated by the next run anyway.
#[derive(Debug, Default)]
pub struct ConcurrencyGate {
    active: Mutex<HashSet<GateKey>>,
}

impl ConcurrencyGate {
    /// Creates an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` active, returning false if it already was.
    pub fn try_enter(&self, key: &GateKey) -> bool {
        self.lock().insert(key.clone())
    }

    /// Marks `key` inactive.
    pub fn leave(&self, key: &GateKey) {
        self.lock().remove(key);
    }

    /// Enters `key` for the lifetime of the returned guard.
    #[must_use]
    pub fn try_acquire(&self, key: GateKey) -> Option<GateGuard<'_>> {
        self.try_enter(&key).then(|| GateGuard { gate: self, key })
    }

    /// Whether a run holds `key`.
    pub fn is_active(&self, key: &GateKey) -> bool {
        self.lock().contains(key)
    }

    // The set stays consistent even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, HashSet<GateKey>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Leaves its key when dropped.
#[derive(Debug)]
pub struct GateGuard<'a> {
    gate: &'a ConcurrencyGate,
    key: GateKey,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.leave(&self.key);
    }
}
