//! Client-side release-year window.
//!
//! Festival premieres and public releases are often a year or two apart, so
//! candidates are never filtered by year on the server. Instead the retrieved
//! list is trimmed here, with a wider window for titles that have few votes.

use super::provider::CandidateRecord;
use crate::config::MatchingConfig;

/// Year tolerance settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub normal: u16,
    pub obscure: u16,
    /// Candidates with fewer votes than this (or no vote data) are obscure.
    pub obscure_below_votes: u32,
}

impl Default for YearWindow {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

impl YearWindow {
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            normal: config.year_window,
            obscure: config.obscure_year_window.max(config.year_window),
            obscure_below_votes: config.obscure_vote_count,
        }
    }

    /// Window that applies to a candidate with the given vote count.
    pub fn for_votes(&self, vote_count: Option<u32>) -> u16 {
        match vote_count {
            Some(votes) if votes >= self.obscure_below_votes => self.normal,
            _ => self.obscure,
        }
    }

    /// Whether a candidate year is acceptable against the source year.
    ///
    /// Unknown years on either side never exclude a candidate; scoring will
    /// simply not award the exact-year bonus.
    pub fn admits(&self, source_year: Option<u16>, candidate_year: Option<u16>, vote_count: Option<u32>) -> bool {
        match (source_year, candidate_year) {
            (Some(source), Some(candidate)) => {
                source.abs_diff(candidate) <= self.for_votes(vote_count)
            }
            _ => true,
        }
    }

    /// Keep only candidates inside the window, preserving order.
    pub fn filter(&self, candidates: Vec<CandidateRecord>, source_year: Option<u16>) -> Vec<CandidateRecord> {
        candidates
            .into_iter()
            .filter(|c| self.admits(source_year, c.release_year, c.vote_count))
            .collect()
    }
}
