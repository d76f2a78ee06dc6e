//! Catalog entries supplied by the catalog-sync collaborator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ExternalId, MediaType};

/// One media item awaiting metadata enrichment.
///
/// Entries are immutable inputs: the engine never modifies them and they are
/// discarded once resolution finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display title as published by the source catalog (often English).
    pub title: String,
    /// Title in the original language, if the catalog knows it.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Release year according to the source catalog.
    #[serde(default)]
    pub year: Option<u16>,
    /// Runtime in minutes.
    #[serde(default, alias = "duration")]
    pub duration_minutes: Option<u32>,
    /// Director names in catalog order.
    #[serde(default)]
    pub directors: Vec<String>,
    /// ISO country codes where the item is available.
    #[serde(default)]
    pub countries: BTreeSet<String>,
    /// Deterministic cross-referenced identifier, if the catalog carries one.
    #[serde(default)]
    pub external_id: Option<ExternalId>,
    /// Movie or series.
    #[serde(default)]
    pub media_type: MediaType,
}

impl CatalogEntry {
    /// Create a movie entry with just a title and year.
    pub fn new(title: impl Into<String>, year: u16) -> Self {
        Self {
            title: title.into(),
            original_title: None,
            year: Some(year),
            duration_minutes: None,
            directors: Vec::new(),
            countries: BTreeSet::new(),
            external_id: None,
            media_type: MediaType::Movie,
        }
    }

    /// Set the original-language title.
    #[must_use]
    pub fn with_original_title(mut self, original_title: impl Into<String>) -> Self {
        self.original_title = Some(original_title.into());
        self
    }

    /// Append a director.
    #[must_use]
    pub fn with_director(mut self, director: impl Into<String>) -> Self {
        self.directors.push(director.into());
        self
    }

    /// Set the runtime in minutes.
    #[must_use]
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Attach a deterministic identifier.
    #[must_use]
    pub fn with_external_id(mut self, id: ExternalId) -> Self {
        self.external_id = Some(id);
        self
    }

    /// Set the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    /// Original title, only when it is non-empty.
    pub fn original_title(&self) -> Option<&str> {
        self.original_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Director names with blank entries removed.
    pub fn director_names(&self) -> impl Iterator<Item = &str> {
        self.directors
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
    }
}
