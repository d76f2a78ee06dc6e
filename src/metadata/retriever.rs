//! Candidate retrieval: the deterministic-id fast path and the variant search.
//!
//! Every network call goes through [`RetryPolicy::run`]. Failures never leave
//! this module as errors; a failed variant is logged and the next one tried.

use std::collections::HashSet;
use std::sync::Arc;

use reelmatch_common::{CatalogEntry, ExternalId};
use tracing::{debug, info};

use super::provider::{CandidateRecord, MetadataProvider, SearchQuery};
use super::retry::{CallOutcome, RetryPolicy};
use super::temporal::YearWindow;
use super::verifier::{signals, VerifiedCandidate};

/// Sanity floors a deterministic id must clear before it is trusted.
#[derive(Debug, Clone, Copy)]
pub struct FastPathFloors {
    pub title: u8,
    /// Applied only when both sides list directors.
    pub director: u8,
}

pub struct Retriever {
    provider: Arc<dyn MetadataProvider>,
    retry: RetryPolicy,
    include_adult: bool,
    aggregate_variants: bool,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        retry: RetryPolicy,
        include_adult: bool,
        aggregate_variants: bool,
    ) -> Self {
        Self {
            provider,
            retry,
            include_adult,
            aggregate_variants,
        }
    }

    /// Resolve `id` directly and check that it plausibly describes `entry`.
    ///
    /// Returns `None` when the lookup fails or the record fails the sanity
    /// check (similarity floors or year window); the identifier is then
    /// treated as stale.
    pub async fn fast_path(
        &self,
        entry: &CatalogEntry,
        id: &ExternalId,
        floors: FastPathFloors,
        window: &YearWindow,
    ) -> Option<VerifiedCandidate> {
        let provider = &self.provider;
        let attempted = self
            .retry
            .run("lookup", || provider.lookup(id, entry.media_type))
            .await;

        let detail = match attempted.outcome {
            CallOutcome::Success(detail) => detail,
            other => {
                debug!(id = %id, outcome = ?other, "Deterministic lookup gave no record");
                return None;
            }
        };

        let signals = signals(entry, &detail);
        let title_ok = signals.title_similarity >= floors.title;
        let director_ok = signals
            .director_similarity
            .map_or(true, |sim| sim >= floors.director);
        let year_ok = window.admits(entry.year, detail.release_year, detail.vote_count);

        if title_ok && director_ok && year_ok {
            Some(VerifiedCandidate { detail, signals })
        } else {
            info!(
                id = %id,
                title = %entry.title,
                title_similarity = signals.title_similarity,
                director_similarity = ?signals.director_similarity,
                year = ?detail.release_year,
                "Discarding stale identifier, falling back to search"
            );
            None
        }
    }

    /// Search each variant in order.
    ///
    /// Stops at the first variant with results unless aggregation is enabled,
    /// in which case all variants are searched and hits merged by id.
    pub async fn search(&self, entry: &CatalogEntry, variants: &[String]) -> Vec<CandidateRecord> {
        let provider = &self.provider;
        let mut seen: HashSet<String> = HashSet::new();
        let mut pooled: Vec<CandidateRecord> = Vec::new();

        for variant in variants {
            let query = SearchQuery {
                text: variant,
                media_type: entry.media_type,
                include_adult: self.include_adult,
            };
            let attempted = self.retry.run("search", || provider.search(query)).await;

            let hits = match attempted.outcome {
                CallOutcome::Success(hits) => hits,
                _ => continue,
            };
            debug!(variant = %variant, hits = hits.len(), "Variant searched");
            if hits.is_empty() {
                continue;
            }

            pooled.extend(hits.into_iter().filter(|c| seen.insert(c.id.clone())));
            if !self.aggregate_variants {
                break;
            }
        }

        pooled
    }
}
