// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

/// Upper bound on parallel uploads or downloads of one run.
pub const MAX_WORKERS: usize = 4;

/// Bounded fan-out for the uploads and downloads of a run.
///
/// Owned by whoever drives the run; cloning shares the same permits.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `size` jobs at once (at least one).
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// `min(available parallelism, 4)`.
    #[must_use]
    pub fn default_size() -> usize {
        std::thread::available_parallelism()
            .map_or(1, NonZeroUsize::get)
            .min(MAX_WORKERS)
    }

    /// Number of jobs that may run at once.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Runs every job and returns their outputs in order once all finished.
    pub async fn run_all<I, F, T>(&self, jobs: I) -> Vec<T>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = T>,
    {
        join_all(jobs.into_iter().map(|job| {
            let permits = Arc::clone(&self.permits);
            async move {
                // The semaphore is never closed.
                let _permit = permits.acquire().await.ok();
                job.await
            }
        }))
        .await
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(Self::default_size())
    }
}
