//! Confidence scoring.
//!
//! A candidate's match signals are combined into one integer score. Each
//! signal adds a bonus above its "match" cut-off and a penalty below its
//! "mismatch" cut-off; in between it contributes nothing. Missing signals
//! contribute nothing either way.

use crate::config::ScoringConfig;

/// Comparison of one verified candidate against the catalog entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSignals {
    /// Best title similarity across title/original-title pairs (0-100).
    pub title_similarity: u8,
    /// Best director-name similarity, `None` when either side lists no directors.
    pub director_similarity: Option<u8>,
    /// Absolute runtime difference in minutes, when both runtimes are known.
    pub runtime_delta: Option<u32>,
    /// Absolute release-year difference, when both years are known.
    pub year_delta: Option<u16>,
}

/// Combine signals into a confidence score. Pure; never suspends.
///
/// The score never decreases when `director_similarity` increases with the
/// other signals held fixed.
pub fn score(signals: &MatchSignals, weights: &ScoringConfig) -> i32 {
    let mut total = 0;

    if let Some(director) = signals.director_similarity {
        if director > weights.director_match_above {
            total += weights.director_match_bonus;
        } else if director < weights.director_mismatch_below {
            total += weights.director_mismatch_penalty;
        }
    }

    let title = signals.title_similarity;
    if title > weights.title_match_above {
        total += weights.title_match_bonus;
    } else if title < weights.title_mismatch_below {
        total += weights.title_mismatch_penalty;
    }

    if let Some(delta) = signals.runtime_delta {
        if delta <= weights.runtime_close_within {
            total += weights.runtime_close_bonus;
        } else if delta > weights.runtime_far_beyond {
            total += weights.runtime_far_penalty;
        }
    }

    if signals.year_delta == Some(0) {
        total += weights.exact_year_bonus;
    }

    total
}
