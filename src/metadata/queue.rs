//! Bounded-concurrency resolution of a whole catalog.
//!
//! Entries are independent, so [`ResolutionQueue::resolve_all`] resolves many
//! at once, bounded by a semaphore sized for provider rate limits. Within one
//! entry everything stays sequential (see [`Resolver`]).
//!
//! Cancellation is cooperative. A cancelled entry is dropped at its current
//! network await, before the cache write, so it leaves no cache entry behind.

use std::sync::Arc;

use reelmatch_common::{CatalogEntry, ResolutionResult};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::resolver::Resolver;

/// Log progress every this many finished entries.
const PROGRESS_EVERY: usize = 10;

/// One catalog entry and its outcome. `result` is `None` if the entry was
/// cancelled before reaching a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEntry {
    pub entry: CatalogEntry,
    pub result: Option<ResolutionResult>,
}

/// Summary counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ResolvedEntry]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };
        for r in results {
            match &r.result {
                Some(result) if result.success() => summary.matched += 1,
                Some(_) => summary.unmatched += 1,
                None => summary.cancelled += 1,
            }
        }
        summary
    }
}

pub struct ResolutionQueue {
    resolver: Arc<Resolver>,
    concurrency: usize,
}

impl ResolutionQueue {
    pub fn new(resolver: Arc<Resolver>, concurrency: usize) -> Self {
        Self {
            resolver,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve every entry with at most `concurrency` in flight.
    ///
    /// Results come back in input order.
    pub async fn resolve_all(
        &self,
        entries: Vec<CatalogEntry>,
        cancel: CancellationToken,
    ) -> Vec<ResolvedEntry> {
        let total = entries.len();
        info!(total, concurrency = self.concurrency, "Resolving catalog");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, entry) in entries.iter().cloned().enumerate() {
            let resolver = self.resolver.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let work = async {
                    let _permit = semaphore.acquire().await.ok()?;
                    Some(resolver.resolve(&entry).await)
                };
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = work => result,
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<ResolutionResult>> = vec![None; total];
        let mut finished = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    results[index] = result;
                }
                Err(e) => {
                    error!(error = %e, "Resolution task failed");
                }
            }
            finished += 1;
            if finished % PROGRESS_EVERY == 0 || finished == total {
                info!(finished, total, "Resolution progress");
            }
        }

        entries
            .into_iter()
            .zip(results)
            .map(|(entry, result)| ResolvedEntry { entry, result })
            .collect()
    }
}
