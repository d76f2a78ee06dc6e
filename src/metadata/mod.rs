//! Metadata reconciliation: resolving catalog entries to provider records.
//!
//! # Module layout
//!
//! - [`provider`] -- Provider trait, candidate records, and [`ProviderError`].
//! - [`providers`] -- TMDB and OMDb implementations.
//! - [`selector`] -- Picks a provider from configured credentials.
//! - [`variants`] -- Title variants used as search queries.
//! - [`retry`] -- Backoff controller wrapping every provider call.
//! - [`retriever`] -- Deterministic-id fast path and variant search.
//! - [`temporal`] -- Client-side release-year window.
//! - [`similarity`] -- Fuzzy string ratios.
//! - [`verifier`] -- Detail lookups and match signals for top candidates.
//! - [`scoring`] -- Confidence score and acceptance threshold.
//! - [`cache`] -- Persistent cache of positive and negative outcomes.
//! - [`resolver`] -- Per-entry orchestration.
//! - [`queue`] -- Bounded-concurrency batch resolution.

pub mod cache;
pub mod provider;
pub mod providers;
pub mod queue;
pub mod resolver;
pub mod retriever;
pub mod retry;
pub mod scoring;
pub mod selector;
pub mod similarity;
pub mod temporal;
pub mod variants;
pub mod verifier;

pub use cache::{identity_key, CacheEntry, CacheStats, ResultCache};
pub use provider::{
    CandidateDetail, CandidateRecord, MetadataProvider, ProviderError, SearchQuery,
};
pub use queue::{BatchSummary, ResolutionQueue, ResolvedEntry};
pub use resolver::Resolver;
pub use retry::{CallOutcome, RetryPolicy};
pub use scoring::MatchSignals;
pub use selector::{build_provider, select, ProviderChoice};
