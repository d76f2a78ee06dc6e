use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub workers: WorkersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// TMDB v3 API key. Preferred provider when set.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// OMDb API keys, rotated round-robin. Used when no TMDB key is set.
    #[serde(default)]
    pub omdb_api_keys: Vec<String>,

    /// Language tag sent with TMDB requests (default: "en-US")
    #[serde(default = "default_language")]
    pub language: String,

    /// Ask providers to include adult/unrated titles in search results
    #[serde(default = "default_true")]
    pub include_adult: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Override the TMDB API root (used by tests and proxies)
    #[serde(default)]
    pub tmdb_base_url: Option<String>,

    /// Override the OMDb API root
    #[serde(default)]
    pub omdb_base_url: Option<String>,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            omdb_api_keys: Vec::new(),
            language: default_language(),
            include_adult: default_true(),
            request_timeout_secs: default_request_timeout(),
            tmdb_base_url: None,
            omdb_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first (default: 10)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Growth factor applied to the backoff after each retry (default: 1.5)
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_multiplier() -> f64 {
    1.5
}

fn default_max_backoff_secs() -> u64 {
    60
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            multiplier: default_multiplier(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Maximum number of title variants searched per entry
    #[serde(default = "default_max_variants")]
    pub max_variants: usize,

    /// Maximum number of regional-spelling variants among them
    #[serde(default = "default_max_spelling_variants")]
    pub max_spelling_variants: usize,

    /// Keep searching every variant and pool the results instead of stopping
    /// at the first variant with hits
    #[serde(default)]
    pub aggregate_variants: bool,

    /// Number of title-ranked candidates that get a detail lookup
    #[serde(default = "default_verify_top_n")]
    pub verify_top_n: usize,

    /// Verify all top-N candidates and keep the best instead of accepting the
    /// first one that clears the threshold
    #[serde(default)]
    pub verify_all_candidates: bool,

    /// Tolerated year gap for well-known titles
    #[serde(default = "default_year_window")]
    pub year_window: u16,

    /// Tolerated year gap for low-visibility titles
    #[serde(default = "default_obscure_year_window")]
    pub obscure_year_window: u16,

    /// Vote count below which a candidate counts as low-visibility
    #[serde(default = "default_obscure_vote_count")]
    pub obscure_vote_count: u32,

    /// Minimum title similarity for a deterministic id to be trusted
    #[serde(default = "default_fast_path_floor")]
    pub fast_path_title_floor: u8,

    /// Minimum director similarity for a deterministic id to be trusted,
    /// checked only when both sides list directors
    #[serde(default = "default_fast_path_floor")]
    pub fast_path_director_floor: u8,
}

fn default_max_variants() -> usize {
    6
}

fn default_max_spelling_variants() -> usize {
    3
}

fn default_verify_top_n() -> usize {
    3
}

fn default_year_window() -> u16 {
    2
}

fn default_obscure_year_window() -> u16 {
    3
}

fn default_obscure_vote_count() -> u32 {
    50
}

fn default_fast_path_floor() -> u8 {
    50
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_variants: default_max_variants(),
            max_spelling_variants: default_max_spelling_variants(),
            aggregate_variants: false,
            verify_top_n: default_verify_top_n(),
            verify_all_candidates: false,
            year_window: default_year_window(),
            obscure_year_window: default_obscure_year_window(),
            obscure_vote_count: default_obscure_vote_count(),
            fast_path_title_floor: default_fast_path_floor(),
            fast_path_director_floor: default_fast_path_floor(),
        }
    }
}

/// Signal weights and cut-offs for the confidence score.
///
/// Ratios are on a 0-100 scale. Penalties are stored as negative numbers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(default = "default_director_match_above")]
    pub director_match_above: u8,
    #[serde(default = "default_director_match_bonus")]
    pub director_match_bonus: i32,
    #[serde(default = "default_director_mismatch_below")]
    pub director_mismatch_below: u8,
    #[serde(default = "default_director_mismatch_penalty")]
    pub director_mismatch_penalty: i32,

    #[serde(default = "default_title_match_above")]
    pub title_match_above: u8,
    #[serde(default = "default_title_match_bonus")]
    pub title_match_bonus: i32,
    #[serde(default = "default_title_mismatch_below")]
    pub title_mismatch_below: u8,
    #[serde(default = "default_title_mismatch_penalty")]
    pub title_mismatch_penalty: i32,

    #[serde(default = "default_runtime_close_within")]
    pub runtime_close_within: u32,
    #[serde(default = "default_runtime_close_bonus")]
    pub runtime_close_bonus: i32,
    #[serde(default = "default_runtime_far_beyond")]
    pub runtime_far_beyond: u32,
    #[serde(default = "default_runtime_far_penalty")]
    pub runtime_far_penalty: i32,

    #[serde(default = "default_exact_year_bonus")]
    pub exact_year_bonus: i32,

    /// Minimum total score for a candidate to be accepted (default: 80)
    #[serde(default = "default_threshold")]
    pub threshold: i32,
}

fn default_director_match_above() -> u8 {
    85
}
fn default_director_match_bonus() -> i32 {
    60
}
fn default_director_mismatch_below() -> u8 {
    60
}
fn default_director_mismatch_penalty() -> i32 {
    -20
}
fn default_title_match_above() -> u8 {
    90
}
fn default_title_match_bonus() -> i32 {
    30
}
fn default_title_mismatch_below() -> u8 {
    60
}
fn default_title_mismatch_penalty() -> i32 {
    -50
}
fn default_runtime_close_within() -> u32 {
    15
}
fn default_runtime_close_bonus() -> i32 {
    10
}
fn default_runtime_far_beyond() -> u32 {
    40
}
fn default_runtime_far_penalty() -> i32 {
    -30
}
fn default_exact_year_bonus() -> i32 {
    10
}
fn default_threshold() -> i32 {
    80
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            director_match_above: default_director_match_above(),
            director_match_bonus: default_director_match_bonus(),
            director_mismatch_below: default_director_mismatch_below(),
            director_mismatch_penalty: default_director_mismatch_penalty(),
            title_match_above: default_title_match_above(),
            title_match_bonus: default_title_match_bonus(),
            title_mismatch_below: default_title_mismatch_below(),
            title_mismatch_penalty: default_title_mismatch_penalty(),
            runtime_close_within: default_runtime_close_within(),
            runtime_close_bonus: default_runtime_close_bonus(),
            runtime_far_beyond: default_runtime_far_beyond(),
            runtime_far_penalty: default_runtime_far_penalty(),
            exact_year_bonus: default_exact_year_bonus(),
            threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Cache file location (default: "reelmatch-cache.json" in the working directory)
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Lifetime of successful matches
    #[serde(default = "default_positive_ttl_days")]
    pub positive_ttl_days: u32,

    /// Lifetime of "no match" outcomes
    #[serde(default = "default_negative_ttl_days")]
    pub negative_ttl_days: u32,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("reelmatch-cache.json")
}

fn default_positive_ttl_days() -> u32 {
    30
}

fn default_negative_ttl_days() -> u32 {
    7
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            positive_ttl_days: default_positive_ttl_days(),
            negative_ttl_days: default_negative_ttl_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkersConfig {
    /// Catalog entries resolved concurrently (default: 10)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    10
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}
