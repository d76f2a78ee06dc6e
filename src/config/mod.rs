mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable overriding `providers.tmdb_api_key`
pub const TMDB_KEY_ENV: &str = "TMDB_API_KEY";
/// Environment variable overriding `providers.omdb_api_keys` (comma separated)
pub const OMDB_KEY_ENV: &str = "OMDB_API_KEY";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./reelmatch.toml",
        "./config.toml",
        "~/.config/reelmatch/config.toml",
        "/etc/reelmatch/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Replace provider keys with non-empty values from the environment.
fn apply_env_overrides(config: &mut Config) {
    apply_overrides(
        config,
        std::env::var(TMDB_KEY_ENV).ok(),
        std::env::var(OMDB_KEY_ENV).ok(),
    );
}

fn apply_overrides(config: &mut Config, tmdb: Option<String>, omdb: Option<String>) {
    if let Some(key) = tmdb.filter(|k| !k.trim().is_empty()) {
        config.providers.tmdb_api_key = Some(key.trim().to_string());
    }

    if let Some(keys) = omdb {
        let keys: Vec<String> = keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();
        if !keys.is_empty() {
            config.providers.omdb_api_keys = keys;
        }
    }
}

/// One hour.
const MAX_INITIAL_BACKOFF_MS: u64 = 3_600_000;
/// One day.
const MAX_BACKOFF_SECS: u64 = 86_400;

/// Validate configuration
///
/// Missing provider credentials are deliberately not an error: they mean
/// "skip enrichment", which the resolver reports per entry.
pub fn validate_config(config: &Config) -> Result<()> {
    let retry = &config.retry;
    if retry.max_attempts == 0 {
        anyhow::bail!("retry.max_attempts must be at least 1");
    }
    if !(retry.multiplier >= 1.0 && retry.multiplier.is_finite()) {
        anyhow::bail!("retry.multiplier must be >= 1.0, got {}", retry.multiplier);
    }
    if retry.initial_backoff_ms > MAX_INITIAL_BACKOFF_MS {
        anyhow::bail!(
            "retry.initial_backoff_ms must be at most {MAX_INITIAL_BACKOFF_MS}, got {}",
            retry.initial_backoff_ms
        );
    }
    if retry.max_backoff_secs > MAX_BACKOFF_SECS {
        anyhow::bail!(
            "retry.max_backoff_secs must be at most {MAX_BACKOFF_SECS}, got {}",
            retry.max_backoff_secs
        );
    }

    let matching = &config.matching;
    if matching.max_variants == 0 {
        anyhow::bail!("matching.max_variants must be at least 1");
    }
    if matching.verify_top_n == 0 {
        anyhow::bail!("matching.verify_top_n must be at least 1");
    }
    if matching.obscure_year_window < matching.year_window {
        anyhow::bail!(
            "matching.obscure_year_window ({}) cannot be narrower than matching.year_window ({})",
            matching.obscure_year_window,
            matching.year_window
        );
    }
    if matching.fast_path_title_floor > 100 || matching.fast_path_director_floor > 100 {
        anyhow::bail!("fast-path similarity floors are percentages (0-100)");
    }

    let scoring = &config.scoring;
    if !(0..=200).contains(&scoring.threshold) {
        anyhow::bail!(
            "scoring.threshold must be between 0 and 200, got {}",
            scoring.threshold
        );
    }
    if scoring.director_mismatch_below > scoring.director_match_above
        || scoring.title_mismatch_below > scoring.title_match_above
    {
        anyhow::bail!("scoring mismatch cut-offs must not exceed the match cut-offs");
    }
    if scoring.runtime_close_within > scoring.runtime_far_beyond {
        anyhow::bail!("scoring.runtime_close_within cannot exceed scoring.runtime_far_beyond");
    }

    if config.cache.positive_ttl_days == 0 || config.cache.negative_ttl_days == 0 {
        anyhow::bail!("cache TTLs must be at least one day");
    }

    if config.workers.concurrency == 0 {
        anyhow::bail!("workers.concurrency must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        validate_config(&config).unwrap();
        assert_eq!(config.scoring.threshold, 80);
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.workers.concurrency, 10);
        assert!(config.providers.include_adult);
    }

    #[test]
    fn parses_partial_file() {
        let file = write_config(
            r#"
            [providers]
            tmdb_api_key = "abc"

            [scoring]
            threshold = 90

            [cache]
            negative_ttl_days = 2
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.scoring.threshold, 90);
        assert_eq!(config.scoring.director_match_bonus, 60);
        assert_eq!(config.cache.negative_ttl_days, 2);
        assert_eq!(config.cache.positive_ttl_days, 30);
        assert_eq!(config.matching.verify_top_n, 3);
    }

    #[test]
    fn rejects_inverted_year_windows() {
        let mut config = Config::default();
        config.matching.year_window = 4;
        config.matching.obscure_year_window = 3;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut config = Config::default();
        config.workers.concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_shrinking_backoff() {
        let mut config = Config::default();
        config.retry.multiplier = 0.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_unbounded_backoff() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = u64::MAX;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.retry.max_backoff_secs = u64::MAX;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.retry.multiplier = f64::INFINITY;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let file = write_config("[scoring\nthreshold = ");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn env_overrides_replace_non_empty_values() {
        let mut config = Config::default();
        config.providers.tmdb_api_key = Some("from-file".into());

        apply_overrides(
            &mut config,
            Some("  ".into()),
            Some("k1, ,k2".into()),
        );
        assert_eq!(config.providers.tmdb_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.providers.omdb_api_keys, vec!["k1", "k2"]);

        apply_overrides(&mut config, Some("from-env".into()), Some(",".into()));
        assert_eq!(config.providers.tmdb_api_key.as_deref(), Some("from-env"));
        assert_eq!(config.providers.omdb_api_keys, vec!["k1", "k2"]);
    }
}
