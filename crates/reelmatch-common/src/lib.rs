//! Reelmatch-Common: Shared types and utilities.
//!
//! This crate provides the data model exchanged between the reconciliation
//! engine and its collaborators:
//!
//! - **Catalog input**: [`CatalogEntry`] describes one film awaiting enrichment.
//! - **Core Types**: [`MediaType`] and [`ExternalId`] for identity and lookups.
//! - **Resolution output**: [`ResolutionResult`] is either a confident match or
//!   a deliberate "no match" with a [`FailureReason`].
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use reelmatch_common::{CatalogEntry, FailureReason, ResolutionResult};
//!
//! let entry = CatalogEntry::new("Mother", 2009).with_director("Bong Joon-ho");
//! assert_eq!(entry.year, Some(2009));
//!
//! let result = ResolutionResult::no_match("tmdb", FailureReason::NoCandidates, 0);
//! assert!(!result.success());
//! assert!(result.matched_id().is_none());
//! ```

pub mod catalog;
pub mod error;
pub mod resolution;
pub mod types;

pub use catalog::CatalogEntry;
pub use error::{Error, Result};
pub use resolution::{FailureReason, MatchDetails, ResolutionResult};
pub use types::*;
