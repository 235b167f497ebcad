// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::mem;

/// Number of resources fetched by one multiget.
pub const DOWNLOAD_BATCH_SIZE: usize = 10;

/// Names waiting to be downloaded, grouped into multiget batches.
#[derive(Debug)]
pub struct PendingDownloadQueue {
    batch_size: usize,
    current: Vec<String>,
    full: Vec<Vec<String>>,
}

impl PendingDownloadQueue {
    /// Creates a queue cutting batches of `batch_size` names (at least one).
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            current: Vec::with_capacity(batch_size),
            full: Vec::new(),
        }
    }

    /// Queues a name, closing the current batch once it is full.
    pub fn push(&mut self, name: String) {
        self.current.push(name);
        if self.current.len() >= self.batch_size {
            let batch = mem::replace(&mut self.current, Vec::with_capacity(self.batch_size));
            self.full.push(batch);
        }
    }

    /// Number of queued names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.full.iter().map(Vec::len).sum::<usize>() + self.current.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full.is_empty() && self.current.is_empty()
    }

    /// Takes every batch, including a final partial one, leaving the queue
    /// empty.
    pub fn take_batches(&mut self) -> Vec<Vec<String>> {
        let mut batches = mem::take(&mut self.full);
        if !self.current.is_empty() {
            batches.push(mem::take(&mut self.current));
        }
        batches
    }
}

impl Default for PendingDownloadQueue {
    fn default() -> Self {
        Self::new(DOWNLOAD_BATCH_SIZE)
    }
}
