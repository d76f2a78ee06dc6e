//! Provider selection from configured credentials.
//!
//! Selection is split in two: [`select`] is a pure decision over the
//! configured keys, and [`build_provider`] turns that decision into a live
//! provider handle. Priority is fixed: TMDB (detail + crew in one request)
//! first, OMDb as the fallback. Blank or whitespace-only keys count as absent.

use std::sync::Arc;
use std::time::Duration;

use super::provider::{MetadataProvider, ProviderError};
use super::providers::{OmdbProvider, TmdbProvider};
use crate::config::ProvidersConfig;

/// Which provider the configured credentials allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderChoice {
    Tmdb { api_key: String },
    Omdb { api_keys: Vec<String> },
}

impl ProviderChoice {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tmdb { .. } => "tmdb",
            Self::Omdb { .. } => "omdb",
        }
    }
}

fn usable(key: &str) -> Option<String> {
    let key = key.trim();
    (!key.is_empty()).then(|| key.to_string())
}

/// Pick a provider from the configured credentials.
///
/// Returns `None` when no credential is usable; callers treat that as "skip
/// enrichment", not as a failure.
pub fn select(config: &ProvidersConfig) -> Option<ProviderChoice> {
    if let Some(api_key) = config.tmdb_api_key.as_deref().and_then(usable) {
        return Some(ProviderChoice::Tmdb { api_key });
    }

    let api_keys: Vec<String> = config
        .omdb_api_keys
        .iter()
        .filter_map(|k| usable(k))
        .collect();
    if !api_keys.is_empty() {
        return Some(ProviderChoice::Omdb { api_keys });
    }

    None
}

/// Build the selected provider, honouring base URL overrides.
///
/// `Ok(None)` means no provider is configured.
pub fn build_provider(
    config: &ProvidersConfig,
) -> Result<Option<Arc<dyn MetadataProvider>>, ProviderError> {
    let timeout = Duration::from_secs(config.request_timeout_secs.max(1));

    let provider: Arc<dyn MetadataProvider> = match select(config) {
        None => return Ok(None),
        Some(ProviderChoice::Tmdb { api_key }) => {
            let mut tmdb = TmdbProvider::new(&api_key, &config.language, timeout)?;
            if let Some(url) = &config.tmdb_base_url {
                tmdb = tmdb.with_base_url(url.as_str());
            }
            Arc::new(tmdb)
        }
        Some(ProviderChoice::Omdb { api_keys }) => {
            let mut omdb = OmdbProvider::new(api_keys, timeout)?;
            if let Some(url) = &config.omdb_base_url {
                omdb = omdb.with_base_url(url.as_str());
            }
            Arc::new(omdb)
        }
    };

    Ok(Some(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn providers(tmdb: Option<&str>, omdb: &[&str]) -> ProvidersConfig {
        ProvidersConfig {
            tmdb_api_key: tmdb.map(String::from),
            omdb_api_keys: omdb.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn tmdb_wins_when_both_are_configured() {
        let choice = select(&providers(Some(" tmdb-key "), &["omdb-key"])).unwrap();
        assert_eq!(
            choice,
            ProviderChoice::Tmdb {
                api_key: "tmdb-key".into()
            }
        );
        assert_eq!(choice.name(), "tmdb");
    }

    #[test]
    fn blank_tmdb_key_falls_back_to_omdb() {
        let choice = select(&providers(Some("   "), &["", "k1", " k2 "])).unwrap();
        assert_eq!(
            choice,
            ProviderChoice::Omdb {
                api_keys: vec!["k1".into(), "k2".into()]
            }
        );
    }

    #[test]
    fn nothing_usable_selects_nothing() {
        assert_eq!(select(&providers(None, &[])), None);
        assert_eq!(select(&providers(Some(""), &["  ", "\t"])), None);
    }

    #[test]
    fn build_without_credentials_is_none() {
        assert!(build_provider(&providers(None, &[])).unwrap().is_none());
    }

    #[test]
    fn build_returns_named_provider() {
        let provider = build_provider(&providers(None, &["k"])).unwrap().unwrap();
        assert_eq!(provider.name(), "omdb");

        let provider = build_provider(&providers(Some("t"), &["k"])).unwrap().unwrap();
        assert_eq!(provider.name(), "tmdb");
    }
}
