//! Resolution outcomes handed to the enrichment collaborator.
//!
//! A [`ResolutionResult`] is either a confident match or a deliberate
//! "no match". Partial results cannot be built: the only constructors are
//! [`ResolutionResult::accept`], which refuses scores below the threshold, and
//! [`ResolutionResult::no_match`], which never carries an identifier.
//! Deserialization applies the same rules, so a tampered cache file cannot
//! smuggle in a half-populated result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Why a resolution ended without a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No provider credentials were usable; enrichment should be skipped.
    NoProviderConfigured,
    /// Every title variant came back empty.
    NoCandidates,
    /// Candidates existed but none fell inside the temporal window.
    NoCandidatesInWindow,
    /// Detail lookups failed for every surviving candidate.
    VerificationFailed,
    /// Candidates were verified but none reached the acceptance threshold.
    BelowThreshold,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NoProviderConfigured => "no metadata provider configured",
            Self::NoCandidates => "no candidates found",
            Self::NoCandidatesInWindow => "no candidates within the temporal window",
            Self::VerificationFailed => "candidate verification failed",
            Self::BelowThreshold => "no match met confidence threshold",
        };
        f.write_str(msg)
    }
}

/// Verification data describing the accepted candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub runtime_minutes: Option<u32>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u32>,
}

/// Outcome of resolving one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResolution")]
pub struct ResolutionResult {
    success: bool,
    matched_id: Option<String>,
    cross_reference_id: Option<String>,
    confidence_score: i32,
    provider_name: String,
    failure_reason: Option<FailureReason>,
    details: Option<MatchDetails>,
}

impl ResolutionResult {
    /// Build a successful result.
    ///
    /// Returns `None` when `score` is below `threshold` or `matched_id` is
    /// blank; callers then fall back to [`no_match`](Self::no_match).
    pub fn accept(
        provider_name: impl Into<String>,
        matched_id: impl Into<String>,
        cross_reference_id: Option<String>,
        score: i32,
        threshold: i32,
        details: MatchDetails,
    ) -> Option<Self> {
        let matched_id = matched_id.into();
        if score < threshold || matched_id.trim().is_empty() {
            return None;
        }
        Some(Self {
            success: true,
            matched_id: Some(matched_id),
            cross_reference_id: cross_reference_id.filter(|id| !id.trim().is_empty()),
            confidence_score: score,
            provider_name: provider_name.into(),
            failure_reason: None,
            details: Some(details),
        })
    }

    /// Build a "no match" result. `best_score` records the highest score seen.
    pub fn no_match(
        provider_name: impl Into<String>,
        reason: FailureReason,
        best_score: i32,
    ) -> Self {
        Self {
            success: false,
            matched_id: None,
            cross_reference_id: None,
            confidence_score: best_score,
            provider_name: provider_name.into(),
            failure_reason: Some(reason),
            details: None,
        }
    }

    /// Result signalling that no provider could be selected.
    pub fn unconfigured() -> Self {
        Self::no_match("none", FailureReason::NoProviderConfigured, 0)
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// Provider-assigned id of the accepted record.
    pub fn matched_id(&self) -> Option<&str> {
        self.matched_id.as_deref()
    }

    /// Cross-reference id (IMDb) of the accepted record, when the provider has one.
    pub fn cross_reference_id(&self) -> Option<&str> {
        self.cross_reference_id.as_deref()
    }

    pub fn confidence_score(&self) -> i32 {
        self.confidence_score
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.failure_reason
    }

    pub fn details(&self) -> Option<&MatchDetails> {
        self.details.as_ref()
    }

    /// True when the caller should skip enrichment because nothing is configured.
    pub fn is_configuration_error(&self) -> bool {
        self.failure_reason == Some(FailureReason::NoProviderConfigured)
    }
}

#[derive(Deserialize)]
struct RawResolution {
    success: bool,
    #[serde(default)]
    matched_id: Option<String>,
    #[serde(default)]
    cross_reference_id: Option<String>,
    confidence_score: i32,
    provider_name: String,
    #[serde(default)]
    failure_reason: Option<FailureReason>,
    #[serde(default)]
    details: Option<MatchDetails>,
}

impl TryFrom<RawResolution> for ResolutionResult {
    type Error = Error;

    fn try_from(raw: RawResolution) -> Result<Self, Self::Error> {
        let has_id = raw
            .matched_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());

        if raw.success {
            if !has_id || raw.failure_reason.is_some() {
                return Err(Error::invalid_input(
                    "successful resolution without a matched id",
                ));
            }
        } else if has_id || raw.cross_reference_id.is_some() || raw.details.is_some() {
            return Err(Error::invalid_input(
                "failed resolution carrying match data",
            ));
        } else if raw.failure_reason.is_none() {
            return Err(Error::invalid_input("failed resolution without a reason"));
        }

        Ok(Self {
            success: raw.success,
            matched_id: raw.matched_id,
            cross_reference_id: raw.cross_reference_id,
            confidence_score: raw.confidence_score,
            provider_name: raw.provider_name,
            failure_reason: raw.failure_reason,
            details: raw.details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> MatchDetails {
        MatchDetails {
            title: "Mother".to_string(),
            year: Some(2009),
            directors: vec!["Bong Joon-ho".to_string()],
            ..MatchDetails::default()
        }
    }

    #[test]
    fn accept_requires_threshold() {
        assert!(ResolutionResult::accept("tmdb", "30018", None, 79, 80, details()).is_none());

        let result =
            ResolutionResult::accept("tmdb", "30018", Some("tt1216496".into()), 80, 80, details())
                .unwrap();
        assert!(result.success());
        assert_eq!(result.matched_id(), Some("30018"));
        assert_eq!(result.cross_reference_id(), Some("tt1216496"));
        assert!(result.failure_reason().is_none());
    }

    #[test]
    fn accept_rejects_blank_id() {
        assert!(ResolutionResult::accept("tmdb", " ", None, 100, 80, details()).is_none());
    }

    #[test]
    fn no_match_carries_no_ids() {
        let result = ResolutionResult::no_match("tmdb", FailureReason::BelowThreshold, 79);
        assert!(!result.success());
        assert!(result.matched_id().is_none());
        assert!(result.cross_reference_id().is_none());
        assert!(result.details().is_none());
        assert_eq!(result.confidence_score(), 79);
    }

    #[test]
    fn unconfigured_is_flagged() {
        assert!(ResolutionResult::unconfigured().is_configuration_error());
    }

    #[test]
    fn deserialize_rejects_partial_result() {
        let json = r#"{
            "success": false,
            "matched_id": "42",
            "confidence_score": 50,
            "provider_name": "tmdb",
            "failure_reason": "below_threshold"
        }"#;
        assert!(serde_json::from_str::<ResolutionResult>(json).is_err());

        let json = r#"{
            "success": true,
            "matched_id": null,
            "confidence_score": 90,
            "provider_name": "tmdb"
        }"#;
        assert!(serde_json::from_str::<ResolutionResult>(json).is_err());
    }

    #[test]
    fn serde_preserves_result() {
        let result =
            ResolutionResult::accept("tmdb", "30018", Some("tt1216496".into()), 110, 80, details())
                .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: ResolutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn failure_reason_display() {
        assert_eq!(
            FailureReason::BelowThreshold.to_string(),
            "no match met confidence threshold"
        );
    }
}
