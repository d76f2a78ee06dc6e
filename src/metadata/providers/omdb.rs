//! OMDb (Open Movie Database) metadata provider.
//!
//! OMDb is keyed by IMDb id, so the matched id and the cross-reference id of
//! a resolution are the same value. Several API keys may be configured; they
//! are rotated round-robin and a key the service rejects is taken out of
//! rotation for the rest of the process, with the rejected request repeated
//! on the next key.
//!
//! OMDb reports most failures with HTTP 200 and `{"Response": "False"}`; the
//! `Error` text is mapped onto [`ProviderError`] here.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reelmatch_common::{ExternalId, MediaType};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{http_client, parse_year, retry_after};
use crate::metadata::provider::{
    CandidateDetail, CandidateRecord, MetadataProvider, ProviderError, SearchQuery,
};

pub const OMDB_BASE_URL: &str = "https://www.omdbapi.com";

// ---------------------------------------------------------------------------
// OMDb API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbSearchResponse {
    #[serde(default)]
    search: Vec<OmdbSearchHit>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchHit {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

#[derive(Debug, Deserialize)]
struct OmdbDetail {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Writer")]
    writer: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    imdb_votes: Option<String>,
}

/// Envelope fields present on every OMDb response.
#[derive(Debug, Deserialize)]
struct OmdbStatus {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

/// Strip OMDb's "N/A" placeholder.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && v != "N/A"
    })
}

/// "123 min" -> 123
fn parse_runtime(value: Option<String>) -> Option<u32> {
    present(value)?
        .split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .filter(|n| *n > 0)
}

/// "1,234" -> 1234
fn parse_votes(value: Option<String>) -> Option<u32> {
    present(value)?.replace(',', "").parse().ok()
}

fn split_names(value: Option<String>) -> Vec<String> {
    present(value)
        .map(|v| {
            v.split(',')
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn omdb_type(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "movie",
        MediaType::Tv => "series",
    }
}

/// Map an OMDb `Error` message to a provider error.
fn classify_error(message: &str) -> ProviderError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("limit reached") {
        ProviderError::RateLimited { retry_after: None }
    } else if lower.contains("api key") {
        ProviderError::Unauthorized
    } else if lower.contains("not found") || lower.contains("incorrect imdb id") {
        ProviderError::NotFound
    } else {
        ProviderError::Decode(message.to_string())
    }
}

impl OmdbDetail {
    fn into_candidate(self, media_type: MediaType) -> CandidateDetail {
        let mut directors = split_names(self.director);
        if directors.is_empty() && media_type == MediaType::Tv {
            directors = split_names(self.writer);
        }
        let imdb_id = self.imdb_id.trim().to_string();

        CandidateDetail {
            id: imdb_id.clone(),
            title: self.title,
            original_title: None,
            release_year: parse_year(self.year.as_deref()),
            directors,
            runtime_minutes: parse_runtime(self.runtime),
            cross_reference_id: Some(imdb_id),
            vote_average: present(self.imdb_rating).and_then(|r| r.parse().ok()),
            vote_count: parse_votes(self.imdb_votes),
            popularity: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// OMDb metadata provider with API-key rotation.
pub struct OmdbProvider {
    client: reqwest::Client,
    base_url: String,
    keys: Vec<String>,
    next_key: AtomicUsize,
    bad_keys: Mutex<HashSet<usize>>,
}

impl OmdbProvider {
    pub fn new(keys: Vec<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(ProviderError::Unauthorized);
        }

        Ok(Self {
            client: http_client(timeout)?,
            base_url: OMDB_BASE_URL.to_string(),
            keys,
            next_key: AtomicUsize::new(0),
            bad_keys: Mutex::new(HashSet::new()),
        })
    }

    /// Point the provider at a different API root (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Next usable key index, or `None` once every key has been rejected.
    fn pick_key(&self) -> Option<usize> {
        let bad = self.bad_keys.lock();
        (0..self.keys.len())
            .map(|_| self.next_key.fetch_add(1, Ordering::Relaxed) % self.keys.len())
            .find(|idx| !bad.contains(idx))
    }

    fn mark_bad(&self, idx: usize) {
        let mut bad = self.bad_keys.lock();
        if bad.insert(idx) {
            warn!(
                key_index = idx,
                remaining = self.keys.len() - bad.len(),
                "OMDb rejected API key, removing it from rotation"
            );
        }
    }

    /// Issue one OMDb request. A rejected key is marked bad and the request
    /// is repeated with the next key; `Unauthorized` surfaces only once every
    /// key has been rejected.
    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, ProviderError> {
        loop {
            let key_idx = self.pick_key().ok_or(ProviderError::Unauthorized)?;
            match self.get_with_key(key_idx, params).await {
                Err(ProviderError::Unauthorized) => self.mark_bad(key_idx),
                other => return other,
            }
        }
    }

    async fn get_with_key<T: DeserializeOwned>(
        &self,
        key_idx: usize,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/", self.base_url);
        debug!(url = %url, key_index = key_idx, ?params, "OMDb request");

        let resp = self
            .client
            .get(&url)
            .query(&[("apikey", self.keys[key_idx].as_str())])
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(
                status.as_u16(),
                retry_after(resp.headers()),
            ));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let envelope: OmdbStatus = serde_json::from_value(body.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        if envelope.response.as_deref() == Some("False") {
            return Err(classify_error(
                envelope.error.as_deref().unwrap_or("unknown error"),
            ));
        }

        serde_json::from_value(body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MetadataProvider for OmdbProvider {
    fn name(&self) -> &'static str {
        "omdb"
    }

    async fn search(&self, query: SearchQuery<'_>) -> Result<Vec<CandidateRecord>, ProviderError> {
        let body: OmdbSearchResponse = match self
            .get(&[("s", query.text), ("type", omdb_type(query.media_type))])
            .await
        {
            Ok(body) => body,
            // An empty search is a normal answer, not a failure.
            Err(ProviderError::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(body
            .search
            .into_iter()
            .map(|hit| CandidateRecord {
                id: hit.imdb_id,
                title: hit.title,
                original_title: None,
                release_year: parse_year(hit.year.as_deref()),
                popularity: None,
                vote_count: None,
            })
            .collect())
    }

    async fn details(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<CandidateDetail, ProviderError> {
        let detail: OmdbDetail = self.get(&[("i", id), ("plot", "short")]).await?;
        Ok(detail.into_candidate(media_type))
    }

    async fn lookup(
        &self,
        id: &ExternalId,
        media_type: MediaType,
    ) -> Result<CandidateDetail, ProviderError> {
        match id {
            ExternalId::Imdb(imdb_id) => self.details(imdb_id, media_type).await,
            ExternalId::Tmdb(_) => Err(ProviderError::Unsupported("tmdb ids")),
        }
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        // Any well-formed id answers; a bad key answers "Invalid API key!".
        let _: OmdbDetail = self.get(&[("i", "tt0133093")]).await?;
        Ok(())
    }
}
