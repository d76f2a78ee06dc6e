//! Concrete metadata provider implementations.
//!
//! Each submodule wraps a single external API and implements the
//! [`MetadataProvider`](super::MetadataProvider) trait.

pub mod omdb;
pub mod tmdb;

pub use omdb::OmdbProvider;
pub use tmdb::TmdbProvider;

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

use super::provider::ProviderError;

/// Build the HTTP client shared by a provider's requests.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("reelmatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::Connect(e.to_string()))
}

/// Seconds-valued `Retry-After` header, if present.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Leading four-digit year of a date such as `"2023-04-15"` or `"2011–2019"`.
pub(crate) fn parse_year(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.trim().get(..4))
        .and_then(|y| y.parse::<u16>().ok())
        .filter(|y| *y > 0)
}
