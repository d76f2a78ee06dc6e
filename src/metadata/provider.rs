//! Trait definition and types for metadata providers.
//!
//! This module defines the [`MetadataProvider`] trait that every metadata
//! backend (TMDB, OMDb) implements, the shared records returned by provider
//! queries, and [`ProviderError`], whose [`disposition`](ProviderError::disposition)
//! tells the retry controller what to do with a failed call.

use std::time::Duration;

use async_trait::async_trait;
use reelmatch_common::{ExternalId, MediaType};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Queries and records
// ---------------------------------------------------------------------------

/// A free-text search request.
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a> {
    /// Title variant to search for.
    pub text: &'a str,
    pub media_type: MediaType,
    /// Ask the provider not to hide mature or unrated titles.
    pub include_adult: bool,
}

/// A single search hit. Ephemeral: produced by retrieval, consumed by filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Provider-assigned identifier (TMDB numeric id, or IMDb id for OMDb).
    pub id: String,
    pub title: String,
    pub original_title: Option<String>,
    pub release_year: Option<u16>,
    /// Provider popularity metric, if exposed.
    pub popularity: Option<f64>,
    /// Number of audience votes, if exposed.
    pub vote_count: Option<u32>,
}

/// Detail and crew for one provider record, fetched in a single round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDetail {
    pub id: String,
    pub title: String,
    pub original_title: Option<String>,
    pub release_year: Option<u16>,
    pub directors: Vec<String>,
    pub runtime_minutes: Option<u32>,
    /// IMDb id, when the provider knows it.
    pub cross_reference_id: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u32>,
    pub popularity: Option<f64>,
}

impl CandidateDetail {
    /// Search-level view of this detail record.
    pub fn to_record(&self) -> CandidateRecord {
        CandidateRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            original_title: self.original_title.clone(),
            release_year: self.release_year,
            popularity: self.popularity,
            vote_count: self.vote_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single provider call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The provider asked us to slow down.
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    /// Transient server-side failure (5xx).
    #[error("provider unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    /// The requested record or search had no result.
    #[error("not found")]
    NotFound,

    #[error("credentials rejected")]
    Unauthorized,

    #[error("unexpected HTTP status {status}")]
    Http { status: u16 },

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The provider cannot serve this kind of request (e.g. a foreign id type).
    #[error("operation not supported by provider: {0}")]
    Unsupported(&'static str),
}

/// How the retry controller should treat a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Back off and try the same call again, honouring the provider delay if given.
    Retry(Option<Duration>),
    /// Not-found class: do not retry, move on to the next variant.
    Skip,
    /// Give up on this call.
    Terminal,
}

impl ProviderError {
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::RateLimited { retry_after } => Disposition::Retry(*retry_after),
            Self::Unavailable { .. } | Self::Timeout | Self::Connect(_) => {
                Disposition::Retry(None)
            }
            Self::NotFound | Self::Unsupported(_) => Disposition::Skip,
            Self::Unauthorized | Self::Http { .. } | Self::Decode(_) => Disposition::Terminal,
        }
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: u16, retry_after: Option<Duration>) -> Self {
        match status {
            429 => Self::RateLimited { retry_after },
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            500 | 502 | 503 | 504 => Self::Unavailable { status },
            _ => Self::Http { status },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), None)
        } else {
            Self::Connect(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async capability interface implemented by every metadata provider.
///
/// Each method is exactly one network round trip. Retrying is the caller's
/// job (see [`RetryPolicy`](super::retry::RetryPolicy)); implementations only
/// translate transport and HTTP failures into [`ProviderError`].
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Free-text title search.
    async fn search(&self, query: SearchQuery<'_>) -> Result<Vec<CandidateRecord>, ProviderError>;

    /// Fetch detail, crew, and external ids for `id` in one request.
    async fn details(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<CandidateDetail, ProviderError>;

    /// Direct lookup by a deterministic identifier.
    ///
    /// Returns [`ProviderError::NotFound`] when the provider has no record and
    /// [`ProviderError::Unsupported`] for identifier kinds it cannot resolve.
    async fn lookup(
        &self,
        id: &ExternalId,
        media_type: MediaType,
    ) -> Result<CandidateDetail, ProviderError>;

    /// Cheap authenticated request used to check connectivity and credentials.
    async fn ping(&self) -> Result<(), ProviderError>;
}
