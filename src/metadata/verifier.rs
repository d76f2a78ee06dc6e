//! Deep verification of the strongest candidates.
//!
//! Surviving candidates are ranked by title similarity and only the top few
//! get a detail lookup (detail + crew + external ids in one request). The
//! detail is then compared against the catalog entry to produce
//! [`MatchSignals`] for the scorer.

use std::sync::Arc;

use reelmatch_common::{CatalogEntry, MatchDetails};
use tracing::debug;

use super::provider::{CandidateDetail, CandidateRecord, MetadataProvider};
use super::retry::RetryPolicy;
use super::scoring::MatchSignals;
use super::similarity::{name_similarity, weighted_ratio};

/// A candidate with its fetched detail and comparison signals.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedCandidate {
    pub detail: CandidateDetail,
    pub signals: MatchSignals,
}

impl VerifiedCandidate {
    pub fn match_details(&self) -> MatchDetails {
        MatchDetails {
            title: self.detail.title.clone(),
            original_title: self.detail.original_title.clone(),
            year: self.detail.release_year,
            directors: self.detail.directors.clone(),
            runtime_minutes: self.detail.runtime_minutes,
            vote_average: self.detail.vote_average,
            vote_count: self.detail.vote_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Pure comparisons
// ---------------------------------------------------------------------------

/// Best similarity between the entry's titles and a candidate's titles.
pub fn title_similarity(entry: &CatalogEntry, title: &str, original_title: Option<&str>) -> u8 {
    let source = [Some(entry.title.as_str()), entry.original_title()];
    let target = [Some(title), original_title];

    source
        .iter()
        .flatten()
        .flat_map(|s| target.iter().flatten().map(move |t| weighted_ratio(s, t)))
        .max()
        .unwrap_or(0)
}

/// Best similarity over every source/candidate director pair.
///
/// `None` when either side has no directors, so a missing credit list is
/// neither a match nor a mismatch.
pub fn director_similarity<'a>(
    source: impl IntoIterator<Item = &'a str>,
    candidate: &[String],
) -> Option<u8> {
    let source: Vec<&str> = source.into_iter().collect();
    source
        .iter()
        .flat_map(|s| candidate.iter().map(move |c| name_similarity(s, c)))
        .max()
}

/// Compare one fetched detail record with the catalog entry.
pub fn signals(entry: &CatalogEntry, detail: &CandidateDetail) -> MatchSignals {
    MatchSignals {
        title_similarity: title_similarity(entry, &detail.title, detail.original_title.as_deref()),
        director_similarity: director_similarity(entry.director_names(), &detail.directors),
        runtime_delta: entry
            .duration_minutes
            .zip(detail.runtime_minutes)
            .map(|(a, b)| a.abs_diff(b)),
        year_delta: entry
            .year
            .zip(detail.release_year)
            .map(|(a, b)| a.abs_diff(b)),
    }
}

/// Order candidates by title similarity and keep `top_n`.
///
/// Ties go to the candidate whose year is closest to the entry's (unknown
/// years last), then to the one with more votes. Remaining ties keep
/// provider order.
pub fn rank_by_title(
    entry: &CatalogEntry,
    candidates: Vec<CandidateRecord>,
    top_n: usize,
) -> Vec<CandidateRecord> {
    let mut scored: Vec<(u8, u16, Option<u32>, CandidateRecord)> = candidates
        .into_iter()
        .map(|c| {
            let similarity = title_similarity(entry, &c.title, c.original_title.as_deref());
            let year_distance = entry
                .year
                .zip(c.release_year)
                .map_or(u16::MAX, |(a, b)| a.abs_diff(b));
            (similarity, year_distance, c.vote_count, c)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| b.2.cmp(&a.2))
    });
    scored.into_iter().take(top_n).map(|(.., c)| c).collect()
}

// ---------------------------------------------------------------------------
// Detail fetch
// ---------------------------------------------------------------------------

/// Fetches candidate detail through the retry controller.
pub struct Verifier {
    provider: Arc<dyn MetadataProvider>,
    retry: RetryPolicy,
}

impl Verifier {
    pub fn new(provider: Arc<dyn MetadataProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Fetch and compare one candidate.
    ///
    /// Returns `None` when the detail lookup fails; the caller moves on to
    /// the next candidate.
    pub async fn verify(
        &self,
        entry: &CatalogEntry,
        candidate: &CandidateRecord,
    ) -> Option<VerifiedCandidate> {
        let provider = &self.provider;
        let attempted = self
            .retry
            .run("details", || provider.details(&candidate.id, entry.media_type))
            .await;

        let detail = attempted.outcome.success()?;
        let signals = signals(entry, &detail);
        debug!(
            candidate = %detail.id,
            title = %detail.title,
            ?signals,
            "Verified candidate"
        );
        Some(VerifiedCandidate { detail, signals })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str, original: Option<&str>) -> CandidateRecord {
        CandidateRecord {
            id: id.into(),
            title: title.into(),
            original_title: original.map(String::from),
            release_year: None,
            popularity: None,
            vote_count: None,
        }
    }

    fn detail(title: &str, directors: &[&str], year: u16, runtime: u32) -> CandidateDetail {
        CandidateDetail {
            id: "1".into(),
            title: title.into(),
            original_title: None,
            release_year: Some(year),
            directors: directors.iter().map(|d| d.to_string()).collect(),
            runtime_minutes: Some(runtime),
            cross_reference_id: None,
            vote_average: None,
            vote_count: None,
            popularity: None,
        }
    }

    #[test]
    fn title_similarity_uses_original_titles() {
        let entry = CatalogEntry::new("Omen", 2023).with_original_title("Augure");
        assert_eq!(title_similarity(&entry, "Augure", None), 100);
        assert_eq!(title_similarity(&entry, "Something", Some("Augure")), 100);
        assert!(title_similarity(&entry, "Zebra Crossing", None) < 60);
    }

    #[test]
    fn director_similarity_takes_best_pair() {
        let candidate = vec!["John Doe".to_string(), "Baloji Tshiani".to_string()];
        assert_eq!(director_similarity(["Baloji"], &candidate), Some(90));
        assert_eq!(director_similarity(Vec::<&str>::new(), &candidate), None);
        assert_eq!(director_similarity(["Baloji"], &[]), None);
    }

    #[test]
    fn signals_compare_runtime_and_year() {
        let entry = CatalogEntry::new("Mother", 2009)
            .with_director("Bong Joon-ho")
            .with_duration(128);
        let s = signals(&entry, &detail("Mother", &["Bong Joon-ho"], 2009, 129));
        assert_eq!(s.title_similarity, 100);
        assert_eq!(s.director_similarity, Some(100));
        assert_eq!(s.runtime_delta, Some(1));
        assert_eq!(s.year_delta, Some(0));
    }

    #[test]
    fn unknown_runtime_gives_no_delta() {
        let entry = CatalogEntry::new("Mother", 2009);
        let s = signals(&entry, &detail("Mother", &[], 2011, 100));
        assert_eq!(s.runtime_delta, None);
        assert_eq!(s.director_similarity, None);
        assert_eq!(s.year_delta, Some(2));
    }

    #[test]
    fn ranking_keeps_best_titles_first() {
        let entry = CatalogEntry::new("Mother", 2009);
        let ranked = rank_by_title(
            &entry,
            vec![
                record("a", "Brother", None),
                record("b", "Mother", None),
                record("c", "Mother!", None),
                record("d", "Smother", None),
            ],
            2,
        );
        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn ranking_ties_prefer_closer_year_then_votes() {
        let entry = CatalogEntry::new("Mother", 2009);
        let at = |id: &str, year: Option<u16>, votes: Option<u32>| CandidateRecord {
            release_year: year,
            vote_count: votes,
            ..record(id, "Mother", None)
        };
        let ranked = rank_by_title(
            &entry,
            vec![
                at("unknown", None, Some(9000)),
                at("far", Some(2011), Some(9000)),
                at("near", Some(2010), Some(100)),
                at("exact-few", Some(2009), Some(10)),
                at("exact-many", Some(2009), Some(5000)),
            ],
            4,
        );
        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["exact-many", "exact-few", "near", "far"]);
    }
}
