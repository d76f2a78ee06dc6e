//! Core type definitions for catalog identity.
//!
//! Enums are serialized in lowercase so cache files and catalog JSON stay
//! readable and stable across releases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Kind of catalog item being resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A feature or short film.
    #[default]
    Movie,
    /// A series.
    Tv,
}

impl MediaType {
    /// Path segment used by providers that split movie and series endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "movies" | "film" => Ok(Self::Movie),
            "tv" | "series" | "show" | "tvshows" => Ok(Self::Tv),
            other => Err(Error::invalid_input(format!("unknown media type: {other}"))),
        }
    }
}

/// A deterministic cross-referenced identifier carried by a catalog entry.
///
/// When present and verified it lets the engine bypass fuzzy search entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "lowercase")]
pub enum ExternalId {
    /// Numeric TMDB identifier.
    Tmdb(u64),
    /// IMDb title identifier (e.g. `tt0133093`).
    Imdb(String),
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tmdb(id) => write!(f, "tmdb:{id}"),
            Self::Imdb(id) => write!(f, "imdb:{id}"),
        }
    }
}

impl FromStr for ExternalId {
    type Err = Error;

    /// Accepts `tt1234567`, a bare TMDB number, or a `tmdb:`/`imdb:` prefixed form.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (prefix, value) = match s.split_once(':') {
            Some((p, v)) => (Some(p.to_ascii_lowercase()), v.trim()),
            None => (None, s),
        };

        match prefix.as_deref() {
            Some("imdb") => parse_imdb(value),
            Some("tmdb") => parse_tmdb(value),
            Some(other) => Err(Error::invalid_input(format!(
                "unknown identifier source: {other}"
            ))),
            None if value.starts_with("tt") => parse_imdb(value),
            None => parse_tmdb(value),
        }
    }
}

fn parse_imdb(value: &str) -> std::result::Result<ExternalId, Error> {
    let digits = value.strip_prefix("tt").unwrap_or("");
    if digits.len() >= 7 && digits.bytes().all(|b| b.is_ascii_digit()) {
        Ok(ExternalId::Imdb(value.to_string()))
    } else {
        Err(Error::invalid_input(format!("malformed IMDb id: {value}")))
    }
}

fn parse_tmdb(value: &str) -> std::result::Result<ExternalId, Error> {
    value
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .map(ExternalId::Tmdb)
        .ok_or_else(|| Error::invalid_input(format!("malformed TMDB id: {value}")))
}
