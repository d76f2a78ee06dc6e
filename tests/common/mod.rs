//! Shared test harness for integration tests.
//!
//! Provides [`StubProvider`], a scripted in-memory [`MetadataProvider`] that
//! records every call, plus helpers to build candidates, details, and a
//! [`Resolver`] with a fast retry policy and an in-memory cache.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use reelmatch::config::{CacheConfig, Config, RetryConfig};
use reelmatch::metadata::{
    CandidateDetail, CandidateRecord, MetadataProvider, ProviderError, Resolver, ResultCache,
    SearchQuery,
};
use reelmatch_common::{ExternalId, MediaType};

/// In-memory provider answering from fixed tables.
#[derive(Default)]
pub struct StubProvider {
    searches: HashMap<String, Result<Vec<CandidateRecord>, ProviderError>>,
    details: HashMap<String, Result<CandidateDetail, ProviderError>>,
    lookups: HashMap<ExternalId, CandidateDetail>,
    calls: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer searches for `query` (case-insensitive) with `hits`.
    pub fn with_search(mut self, query: &str, hits: Vec<CandidateRecord>) -> Self {
        self.searches.insert(query.to_lowercase(), Ok(hits));
        self
    }

    pub fn with_search_error(mut self, query: &str, error: ProviderError) -> Self {
        self.searches.insert(query.to_lowercase(), Err(error));
        self
    }

    pub fn with_detail(mut self, detail: CandidateDetail) -> Self {
        self.details.insert(detail.id.clone(), Ok(detail));
        self
    }

    pub fn with_detail_error(mut self, id: &str, error: ProviderError) -> Self {
        self.details.insert(id.to_string(), Err(error));
        self
    }

    pub fn with_lookup(mut self, id: ExternalId, detail: CandidateDetail) -> Self {
        self.lookups.insert(id, detail);
        self
    }

    /// Every call so far, as `"search:<text>"`, `"details:<id>"`, or `"lookup:<id>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_of(&self, kind: &str) -> Vec<String> {
        let prefix = format!("{kind}:");
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(&prefix))
            .collect()
    }
}

#[async_trait]
impl MetadataProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn search(&self, query: SearchQuery<'_>) -> Result<Vec<CandidateRecord>, ProviderError> {
        self.calls.lock().push(format!("search:{}", query.text));
        self.searches
            .get(&query.text.to_lowercase())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn details(
        &self,
        id: &str,
        _media_type: MediaType,
    ) -> Result<CandidateDetail, ProviderError> {
        self.calls.lock().push(format!("details:{id}"));
        self.details
            .get(id)
            .cloned()
            .unwrap_or(Err(ProviderError::NotFound))
    }

    async fn lookup(
        &self,
        id: &ExternalId,
        _media_type: MediaType,
    ) -> Result<CandidateDetail, ProviderError> {
        self.calls.lock().push(format!("lookup:{id}"));
        self.lookups.get(id).cloned().ok_or(ProviderError::NotFound)
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        self.calls.lock().push("ping".to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn candidate(id: &str, title: &str, year: u16, votes: u32) -> CandidateRecord {
    CandidateRecord {
        id: id.to_string(),
        title: title.to_string(),
        original_title: None,
        release_year: Some(year),
        popularity: None,
        vote_count: Some(votes),
    }
}

pub fn detail(id: &str, title: &str, year: u16, directors: &[&str]) -> CandidateDetail {
    CandidateDetail {
        id: id.to_string(),
        title: title.to_string(),
        original_title: None,
        release_year: Some(year),
        directors: directors.iter().map(|d| d.to_string()).collect(),
        runtime_minutes: None,
        cross_reference_id: Some(format!("tt{:0>7}", id)),
        vote_average: Some(7.0),
        vote_count: Some(500),
        popularity: None,
    }
}

/// Default config with millisecond backoff so retries do not slow tests down.
pub fn test_config() -> Config {
    Config {
        retry: RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 1,
            multiplier: 1.5,
            max_backoff_secs: 1,
        },
        ..Default::default()
    }
}

pub fn memory_cache() -> Arc<ResultCache> {
    Arc::new(ResultCache::in_memory(&CacheConfig::default()))
}

/// Resolver over `provider` with [`test_config`] and an in-memory cache.
pub fn resolver_with(provider: Arc<StubProvider>, config: &Config) -> Resolver {
    let provider: Arc<dyn MetadataProvider> = provider;
    Resolver::new(Some(provider), memory_cache(), config)
}
