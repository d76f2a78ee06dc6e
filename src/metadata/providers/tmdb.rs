//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MetadataProvider`] against the TMDB v3 REST API:
//! - `search/{movie|tv}` with `include_adult` forwarded from the query.
//! - `{movie|tv}/{id}?append_to_response=credits,external_ids`, so detail,
//!   crew, and the IMDb cross-reference arrive in one round trip.
//! - `find/{imdb_id}` for deterministic lookups by IMDb id.
//!
//! No client-side throttling happens here. A 429 is surfaced as
//! [`ProviderError::RateLimited`] with the `Retry-After` delay attached and
//! the retry controller decides what to do with it.

use std::time::Duration;

use async_trait::async_trait;
use reelmatch_common::{ExternalId, MediaType};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{http_client, parse_year, retry_after};
use crate::metadata::provider::{
    CandidateDetail, CandidateRecord, MetadataProvider, ProviderError, SearchQuery,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbSearchResult>,
}

/// Search hit for either media type. TV results use `name`/`first_air_date`.
#[derive(Debug, Deserialize)]
struct TmdbSearchResult {
    id: u64,
    #[serde(alias = "name")]
    title: Option<String>,
    #[serde(alias = "original_name")]
    original_title: Option<String>,
    #[serde(alias = "first_air_date")]
    release_date: Option<String>,
    popularity: Option<f64>,
    vote_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TmdbDetail {
    id: u64,
    #[serde(alias = "name")]
    title: Option<String>,
    #[serde(alias = "original_name")]
    original_title: Option<String>,
    #[serde(alias = "first_air_date")]
    release_date: Option<String>,
    runtime: Option<u32>,
    episode_run_time: Option<Vec<u32>>,
    vote_average: Option<f64>,
    vote_count: Option<u32>,
    popularity: Option<f64>,
    imdb_id: Option<String>,
    credits: Option<TmdbCredits>,
    external_ids: Option<TmdbExternalIds>,
    created_by: Option<Vec<TmdbPerson>>,
}

#[derive(Debug, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Deserialize)]
struct TmdbCrewMember {
    name: String,
    job: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbPerson {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbFindResponse {
    #[serde(default)]
    movie_results: Vec<TmdbFindHit>,
    #[serde(default)]
    tv_results: Vec<TmdbFindHit>,
}

#[derive(Debug, Deserialize)]
struct TmdbFindHit {
    id: u64,
}

impl TmdbDetail {
    /// Credited directors, falling back to series creators for TV.
    fn directors(&self, media_type: MediaType) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let crew = self.credits.iter().flat_map(|c| c.crew.iter());
        for member in crew.filter(|m| m.job.as_deref() == Some("Director")) {
            if !names.contains(&member.name) {
                names.push(member.name.clone());
            }
        }

        if names.is_empty() && media_type == MediaType::Tv {
            for person in self.created_by.iter().flatten() {
                if !names.contains(&person.name) {
                    names.push(person.name.clone());
                }
            }
        }
        names
    }

    fn into_candidate(self, media_type: MediaType) -> CandidateDetail {
        let directors = self.directors(media_type);
        let runtime_minutes = self.runtime.filter(|r| *r > 0).or_else(|| {
            self.episode_run_time
                .as_ref()
                .and_then(|v| v.first().copied())
        });
        let cross_reference_id = self
            .imdb_id
            .or_else(|| self.external_ids.and_then(|e| e.imdb_id))
            .filter(|id| !id.trim().is_empty());

        CandidateDetail {
            id: self.id.to_string(),
            title: self.title.unwrap_or_default(),
            original_title: self.original_title,
            release_year: parse_year(self.release_date.as_deref()),
            directors,
            runtime_minutes,
            cross_reference_id,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB metadata provider.
///
/// # Examples
///
/// ```no_run
/// use reelmatch::metadata::providers::TmdbProvider;
/// use std::time::Duration;
///
/// let provider = TmdbProvider::new("your-api-key", "en-US", Duration::from_secs(10)).unwrap();
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbProvider {
    /// Create a provider talking to the public TMDB API.
    pub fn new(api_key: &str, language: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: TMDB_BASE_URL.to_string(),
            api_key: api_key.trim().to_string(),
            language: language.to_string(),
        })
    }

    /// Point the provider at a different API root (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Issue one authenticated GET and decode the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "TMDB request");

        let resp = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", self.language.as_str())])
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

        resp.json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    /// Resolve an IMDb id to a TMDB id of the requested media type.
    async fn find_by_imdb(&self, imdb_id: &str, media_type: MediaType) -> Result<u64, ProviderError> {
        let found: TmdbFindResponse = self
            .get(&format!("/find/{imdb_id}"), &[("external_source", "imdb_id")])
            .await?;

        let hits = match media_type {
            MediaType::Movie => found.movie_results,
            MediaType::Tv => found.tv_results,
        };
        hits.first().map(|h| h.id).ok_or(ProviderError::NotFound)
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    async fn search(&self, query: SearchQuery<'_>) -> Result<Vec<CandidateRecord>, ProviderError> {
        let include_adult = if query.include_adult { "true" } else { "false" };
        let body: TmdbSearchResponse = self
            .get(
                &format!("/search/{}", query.media_type.as_str()),
                &[("query", query.text), ("include_adult", include_adult)],
            )
            .await?;

        Ok(body
            .results
            .into_iter()
            .map(|r| CandidateRecord {
                id: r.id.to_string(),
                title: r.title.unwrap_or_default(),
                original_title: r.original_title,
                release_year: parse_year(r.release_date.as_deref()),
                popularity: r.popularity,
                vote_count: r.vote_count,
            })
            .collect())
    }

    async fn details(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<CandidateDetail, ProviderError> {
        let detail: TmdbDetail = self
            .get(
                &format!("/{}/{id}", media_type.as_str()),
                &[("append_to_response", "credits,external_ids")],
            )
            .await?;
        Ok(detail.into_candidate(media_type))
    }

    async fn lookup(
        &self,
        id: &ExternalId,
        media_type: MediaType,
    ) -> Result<CandidateDetail, ProviderError> {
        let tmdb_id = match id {
            ExternalId::Tmdb(tmdb_id) => *tmdb_id,
            ExternalId::Imdb(imdb_id) => self.find_by_imdb(imdb_id, media_type).await?,
        };
        self.details(&tmdb_id.to_string(), media_type).await
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        let _: serde_json::Value = self.get("/configuration", &[]).await?;
        Ok(())
    }
}
