//! Resolution of one catalog entry to a provider record.
//!
//! The [`Resolver`] sequences the pipeline for a single entry:
//!
//! 1. Cache check (a hit returns immediately with no network calls).
//! 2. Provider availability (none configured yields a configuration-error result).
//! 3. Deterministic-id fast path, when the entry carries an id that checks out.
//! 4. Variant search, temporal filter, title ranking.
//! 5. Deep verification and scoring of the top candidates, in order.
//! 6. Exactly one cache write for the terminal result.
//!
//! Steps run strictly one after another. Network calls are the only
//! suspension points.

use std::sync::Arc;

use reelmatch_common::{CatalogEntry, FailureReason, ResolutionResult};
use tracing::{debug, info, warn};

use super::cache::{identity_key, ResultCache};
use super::provider::{MetadataProvider, ProviderError};
use super::retriever::{FastPathFloors, Retriever};
use super::retry::RetryPolicy;
use super::scoring::score;
use super::selector::build_provider;
use super::temporal::YearWindow;
use super::variants::generate_variants;
use super::verifier::{rank_by_title, VerifiedCandidate, Verifier};
use crate::config::{Config, MatchingConfig, ScoringConfig};

/// Provider-bound parts of the pipeline; absent when nothing is configured.
struct Engine {
    provider_name: &'static str,
    retriever: Retriever,
    verifier: Verifier,
}

pub struct Resolver {
    engine: Option<Engine>,
    cache: Arc<ResultCache>,
    matching: MatchingConfig,
    scoring: ScoringConfig,
    window: YearWindow,
}

impl Resolver {
    /// Build a resolver around an explicit provider (or none).
    pub fn new(
        provider: Option<Arc<dyn MetadataProvider>>,
        cache: Arc<ResultCache>,
        config: &Config,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);
        let engine = provider.map(|provider| Engine {
            provider_name: provider.name(),
            retriever: Retriever::new(
                provider.clone(),
                retry.clone(),
                config.providers.include_adult,
                config.matching.aggregate_variants,
            ),
            verifier: Verifier::new(provider, retry),
        });

        Self {
            engine,
            cache,
            matching: config.matching.clone(),
            scoring: config.scoring.clone(),
            window: YearWindow::from_config(&config.matching),
        }
    }

    /// Select and build the provider from configured credentials.
    pub fn from_config(config: &Config, cache: Arc<ResultCache>) -> Result<Self, ProviderError> {
        let provider = build_provider(&config.providers)?;
        match &provider {
            Some(p) => info!(provider = p.name(), "Metadata provider selected"),
            None => warn!("No metadata provider credentials configured, enrichment will be skipped"),
        }
        Ok(Self::new(provider, cache, config))
    }

    /// Name of the active provider, if any.
    pub fn provider_name(&self) -> Option<&'static str> {
        self.engine.as_ref().map(|e| e.provider_name)
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Resolve one entry to a confident match or a deliberate no-match.
    ///
    /// Never fails: provider trouble ends in a no-match result. The only
    /// special outcome is [`ResolutionResult::unconfigured`], which is not
    /// cached so that adding credentials takes effect immediately.
    pub async fn resolve(&self, entry: &CatalogEntry) -> ResolutionResult {
        let key = identity_key(entry);
        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, success = cached.success(), "Cache hit");
            return cached;
        }

        let Some(engine) = &self.engine else {
            return ResolutionResult::unconfigured();
        };

        let result = self.resolve_with(engine, entry).await;

        if result.success() {
            info!(
                title = %entry.title,
                matched_id = result.matched_id().unwrap_or_default(),
                score = result.confidence_score(),
                "Match found"
            );
        } else {
            info!(
                title = %entry.title,
                reason = ?result.failure_reason(),
                best_score = result.confidence_score(),
                "No confident match"
            );
        }

        if let Err(e) = self.cache.set(&key, result.clone()) {
            warn!(key = %key, error = %e, "Failed to persist cache entry");
        }
        result
    }

    async fn resolve_with(&self, engine: &Engine, entry: &CatalogEntry) -> ResolutionResult {
        let provider = engine.provider_name;

        if let Some(id) = &entry.external_id {
            let floors = FastPathFloors {
                title: self.matching.fast_path_title_floor,
                director: self.matching.fast_path_director_floor,
            };
            if let Some(verified) = engine
                .retriever
                .fast_path(entry, id, floors, &self.window)
                .await
            {
                // A verified deterministic id is trusted even if the fuzzy score is modest.
                let confidence = score(&verified.signals, &self.scoring).max(self.scoring.threshold);
                if let Some(result) = self.accept(provider, &verified, confidence) {
                    debug!(id = %id, "Resolved via deterministic identifier");
                    return result;
                }
            }
        }

        let variants = generate_variants(
            &entry.title,
            entry.original_title(),
            self.matching.max_variants,
            self.matching.max_spelling_variants,
        );
        debug!(title = %entry.title, ?variants, "Searching title variants");

        let candidates = engine.retriever.search(entry, &variants).await;
        if candidates.is_empty() {
            return ResolutionResult::no_match(provider, FailureReason::NoCandidates, 0);
        }

        let in_window = self.window.filter(candidates, entry.year);
        if in_window.is_empty() {
            return ResolutionResult::no_match(provider, FailureReason::NoCandidatesInWindow, 0);
        }

        let shortlist = rank_by_title(entry, in_window, self.matching.verify_top_n);
        let mut best: Option<(i32, VerifiedCandidate)> = None;
        let mut verified_any = false;

        for candidate in &shortlist {
            let Some(verified) = engine.verifier.verify(entry, candidate).await else {
                continue;
            };
            verified_any = true;

            // The window also applies to the detail record year.
            let votes = verified.detail.vote_count.or(candidate.vote_count);
            if !self
                .window
                .admits(entry.year, verified.detail.release_year, votes)
            {
                debug!(candidate = %verified.detail.id, "Detail year outside window");
                continue;
            }

            let candidate_score = score(&verified.signals, &self.scoring);
            debug!(candidate = %verified.detail.id, score = candidate_score, "Scored candidate");

            if candidate_score >= self.scoring.threshold && !self.matching.verify_all_candidates {
                if let Some(result) = self.accept(provider, &verified, candidate_score) {
                    return result;
                }
            }

            if best.as_ref().map_or(true, |(s, _)| candidate_score > *s) {
                best = Some((candidate_score, verified));
            }
        }

        if !verified_any {
            return ResolutionResult::no_match(provider, FailureReason::VerificationFailed, 0);
        }

        match best {
            Some((best_score, verified)) => self
                .accept(provider, &verified, best_score)
                .unwrap_or_else(|| {
                    ResolutionResult::no_match(provider, FailureReason::BelowThreshold, best_score)
                }),
            None => ResolutionResult::no_match(provider, FailureReason::NoCandidatesInWindow, 0),
        }
    }

    fn accept(
        &self,
        provider: &'static str,
        verified: &VerifiedCandidate,
        confidence: i32,
    ) -> Option<ResolutionResult> {
        ResolutionResult::accept(
            provider,
            verified.detail.id.clone(),
            verified.detail.cross_reference_id.clone(),
            confidence,
            self.scoring.threshold,
            verified.match_details(),
        )
    }
}
