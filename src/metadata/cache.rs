//! Persistent cache of resolution outcomes.
//!
//! The backing store is one JSON document holding a `schema_version` and a
//! map of identity key to [`CacheEntry`]. It is loaded once when the cache is
//! opened; reads are served from the in-memory map and every write rewrites
//! the whole document atomically (temp file + rename) under a single writer
//! lock, so concurrent resolutions never lose each other's updates.
//! Per-write documents are compact and not fsynced; [`ResultCache::flush`]
//! writes a synced copy at the end of a batch.
//!
//! Both successful and failed resolutions are cached, with separate TTLs.
//! Expired entries read as misses and are evicted when touched. A missing,
//! unreadable, or version-mismatched file starts an empty cache.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use reelmatch_common::{CatalogEntry, ResolutionResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::similarity::normalize;
use crate::config::CacheConfig;

/// Bump when the on-disk layout of [`CacheEntry`] changes.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// One cached resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub identity_key: String,
    pub result: ResolutionResult,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    schema_version: u32,
    entries: &'a HashMap<String, CacheEntry>,
}

/// Counts reported by `reelmatch cache stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub expired: usize,
}

/// Cache key for a catalog entry: normalized title, year, and media type.
///
/// `"The Color & Shape"`, 1997, movie becomes `the_color_shape_1997_movie`.
pub fn identity_key(entry: &CatalogEntry) -> String {
    let title = normalize(&entry.title).replace(' ', "_");
    let year = entry
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{title}_{year}_{}", entry.media_type.as_str())
}

pub struct ResultCache {
    path: Option<PathBuf>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    writer: Mutex<()>,
    positive_ttl: Duration,
    negative_ttl: Duration,
}

impl ResultCache {
    /// Open the cache file at `config.path`, starting empty if it cannot be used.
    pub fn open(config: &CacheConfig) -> Self {
        let path = config.path.clone();
        let entries = load_entries(&path);
        info!(path = %path.display(), entries = entries.len(), "Result cache loaded");
        Self::with_entries(Some(path), entries, config)
    }

    /// A cache that never touches disk.
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::with_entries(None, HashMap::new(), config)
    }

    fn with_entries(
        path: Option<PathBuf>,
        entries: HashMap<String, CacheEntry>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            path,
            entries: RwLock::new(entries),
            writer: Mutex::new(()),
            positive_ttl: Duration::days(i64::from(config.positive_ttl_days)),
            negative_ttl: Duration::days(i64::from(config.negative_ttl_days)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Cached result for `key`, if present and not expired.
    pub fn get(&self, key: &str) -> Option<ResolutionResult> {
        self.get_at(key, Utc::now())
    }

    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<ResolutionResult> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.result.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
            debug!(key, "Evicted expired cache entry");
        }
        None
    }

    /// Store `result` under `key` and persist the cache.
    ///
    /// The TTL depends on whether the result is a match.
    pub fn set(&self, key: &str, result: ResolutionResult) -> reelmatch_common::Result<()> {
        let ttl = if result.success() {
            self.positive_ttl
        } else {
            self.negative_ttl
        };
        self.set_with_ttl(key, result, ttl)
    }

    pub fn set_with_ttl(
        &self,
        key: &str,
        result: ResolutionResult,
        ttl: Duration,
    ) -> reelmatch_common::Result<()> {
        let now = Utc::now();
        let entry = CacheEntry {
            identity_key: key.to_string(),
            result,
            cached_at: now,
            expires_at: now + ttl,
        };

        let _writer = self.writer.lock();
        self.entries.write().insert(key.to_string(), entry);
        self.persist_locked(false)
    }

    /// Drop every entry and persist the empty cache. Returns how many were removed.
    pub fn clear(&self) -> reelmatch_common::Result<usize> {
        let _writer = self.writer.lock();
        let removed = {
            let mut entries = self.entries.write();
            let n = entries.len();
            entries.clear();
            n
        };
        self.persist_locked(true)?;
        Ok(removed)
    }

    /// Remove expired entries and persist. Returns how many were removed.
    pub fn prune_expired(&self) -> reelmatch_common::Result<usize> {
        let now = Utc::now();
        let _writer = self.writer.lock();
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, e| !e.is_expired(now));
            before - entries.len()
        };
        if removed > 0 {
            self.persist_locked(true)?;
        }
        Ok(removed)
    }

    /// Persist the current in-memory state and sync it to disk.
    pub fn flush(&self) -> reelmatch_common::Result<()> {
        let _writer = self.writer.lock();
        self.persist_locked(true)
    }

    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let entries = self.entries.read();
        let mut stats = CacheStats {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries.values() {
            if entry.is_expired(now) {
                stats.expired += 1;
            } else if entry.result.success() {
                stats.matched += 1;
            } else {
                stats.unmatched += 1;
            }
        }
        stats
    }

    /// Write the whole map to disk. Caller must hold `self.writer`.
    fn persist_locked(&self, sync: bool) -> reelmatch_common::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = {
            let entries = self.entries.read();
            serde_json::to_vec(&CacheFileRef {
                schema_version: CACHE_SCHEMA_VERSION,
                entries: &*entries,
            })?
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        if sync {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Read the cache file, dropping anything that does not parse.
fn load_entries(path: &Path) -> HashMap<String, CacheEntry> {
    if !path.exists() {
        return HashMap::new();
    }

    let document: serde_json::Value = match std::fs::read(path)
        .map_err(reelmatch_common::Error::from)
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
    {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache file unreadable, starting empty");
            return HashMap::new();
        }
    };

    let version = document.get("schema_version").and_then(|v| v.as_u64());
    if version != Some(u64::from(CACHE_SCHEMA_VERSION)) {
        warn!(
            path = %path.display(),
            found = ?version,
            expected = CACHE_SCHEMA_VERSION,
            "Cache schema version mismatch, resetting cache"
        );
        return HashMap::new();
    }

    let Some(raw) = document.get("entries").and_then(|v| v.as_object()) else {
        warn!(path = %path.display(), "Cache file has no entries map, starting empty");
        return HashMap::new();
    };

    let mut entries = HashMap::with_capacity(raw.len());
    let mut dropped = 0usize;
    for (key, value) in raw {
        match serde_json::from_value::<CacheEntry>(value.clone()) {
            Ok(entry) => {
                entries.insert(key.clone(), entry);
            }
            Err(e) => {
                dropped += 1;
                debug!(key, error = %e, "Dropping invalid cache entry");
            }
        }
    }
    if dropped > 0 {
        warn!(dropped, "Dropped invalid cache entries");
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelmatch_common::{FailureReason, MatchDetails, MediaType};

    fn config(path: PathBuf) -> CacheConfig {
        CacheConfig {
            path,
            ..Default::default()
        }
    }

    fn matched() -> ResolutionResult {
        ResolutionResult::accept(
            "tmdb",
            "1062722",
            Some("tt15490006".into()),
            100,
            80,
            MatchDetails {
                title: "Omen".into(),
                year: Some(2024),
                directors: vec!["Baloji Tshiani".into()],
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn identity_key_is_normalized() {
        let a = CatalogEntry::new("The Color & Shape!", 1997);
        let b = CatalogEntry::new("the color  shape", 1997);
        assert_eq!(identity_key(&a), "the_color_shape_1997_movie");
        assert_eq!(identity_key(&a), identity_key(&b));

        let mut c = CatalogEntry::new("Twin Peaks", 1990).with_media_type(MediaType::Tv);
        c.year = None;
        assert_eq!(identity_key(&c), "twin_peaks_unknown_tv");
    }

    #[test]
    fn ttl_depends_on_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(&config(dir.path().join("cache.json")));
        cache.set("hit", matched()).unwrap();
        cache
            .set("miss", ResolutionResult::no_match("tmdb", FailureReason::NoCandidates, 0))
            .unwrap();

        let entries = cache.entries.read();
        let hit = &entries["hit"];
        let miss = &entries["miss"];
        assert_eq!(hit.expires_at - hit.cached_at, Duration::days(30));
        assert_eq!(miss.expires_at - miss.cached_at, Duration::days(7));
    }

    #[test]
    fn expired_entries_are_misses_and_evicted() {
        let cache = ResultCache::in_memory(&CacheConfig::default());
        cache.set("k", matched()).unwrap();

        assert!(cache.get_at("k", Utc::now()).is_some());
        let later = Utc::now() + Duration::days(31);
        assert!(cache.get_at("k", later).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("nested").join("cache.json"));

        let cache = ResultCache::open(&cfg);
        cache.set("omen_2023_movie", matched()).unwrap();
        drop(cache);

        let reopened = ResultCache::open(&cfg);
        assert_eq!(reopened.get("omen_2023_movie"), Some(matched()));
    }

    #[test]
    fn version_mismatch_resets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, r#"{"schema_version": 999, "entries": {}}"#).unwrap();
        assert!(ResultCache::open(&config(path)).is_empty());
    }

    #[test]
    fn corrupt_file_resets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ResultCache::open(&config(path)).is_empty());
    }

    #[test]
    fn invalid_entries_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("cache.json"));
        let cache = ResultCache::open(&cfg);
        cache.set("good", matched()).unwrap();
        drop(cache);

        let mut doc: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&cfg.path).unwrap()).unwrap();
        doc["entries"]["bad"] = serde_json::json!({
            "identity_key": "bad",
            "result": {
                "success": true,
                "matched_id": null,
                "cross_reference_id": null,
                "confidence_score": 95,
                "provider_name": "tmdb",
                "failure_reason": null,
                "details": null
            },
            "cached_at": "2026-01-01T00:00:00Z",
            "expires_at": "2099-01-01T00:00:00Z"
        });
        std::fs::write(&cfg.path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let reopened = ResultCache::open(&cfg);
        assert_eq!(reopened.len(), 1);
        assert!(reopened.get("good").is_some());
        assert!(reopened.get("bad").is_none());
    }

    #[test]
    fn clear_and_prune() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(&config(dir.path().join("cache.json")));
        cache.set("a", matched()).unwrap();
        cache
            .set_with_ttl("b", matched(), Duration::seconds(-1))
            .unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.expired, 1);

        assert_eq!(cache.prune_expired().unwrap(), 1);
        assert_eq!(cache.clear().unwrap(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_writers_keep_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("cache.json"));
        let cache = ResultCache::open(&cfg);

        std::thread::scope(|scope| {
            for i in 0..16 {
                let cache = &cache;
                scope.spawn(move || cache.set(&format!("title_{i}_movie"), matched()).unwrap());
            }
        });
        drop(cache);

        let reopened = ResultCache::open(&cfg);
        assert_eq!(reopened.len(), 16);
        for i in 0..16 {
            assert!(reopened.get(&format!("title_{i}_movie")).is_some(), "missing {i}");
        }
    }

    #[test]
    fn writes_are_compact_and_flush_persists() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("cache.json"));
        let cache = ResultCache::open(&cfg);
        cache.set("omen_2023_movie", matched()).unwrap();

        let raw = std::fs::read_to_string(&cfg.path).unwrap();
        assert!(!raw.contains('\n'));
        assert!(raw.starts_with(r#"{"schema_version":1,"#));

        cache.flush().unwrap();
        drop(cache);
        assert_eq!(
            ResultCache::open(&cfg).get("omen_2023_movie"),
            Some(matched())
        );
    }
}
