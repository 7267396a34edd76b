//! Persistent definition cache.
//!
//! The [`FetchCache`] maps terms to definitions and survives across runs as a
//! JSON object on disk (`{"term": "definition", ...}`).
//!
//! **Lifecycle:**
//! - loaded once when a run starts ([`FetchCache::open`] starts empty when the
//!   file is missing or unreadable)
//! - mutated in memory on every provider miss
//! - written back once at shutdown via [`FetchCache::flush`]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use termdeck_shared::{Result, TermDeckError, write_atomic};
use tracing::{debug, info, warn};

/// Term → definition store backed by a JSON file.
#[derive(Debug)]
pub struct FetchCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    dirty: bool,
}

impl FetchCache {
    /// Load the cache at `path`. A missing file yields an empty cache; an
    /// unreadable or malformed file is a [`TermDeckError::CacheLoad`].
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| TermDeckError::CacheLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            serde_json::from_str::<BTreeMap<String, String>>(&content).map_err(|e| {
                TermDeckError::CacheLoad {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            })?
        } else {
            debug!(?path, "cache file not found, starting empty");
            BTreeMap::new()
        };

        info!(?path, entries = entries.len(), "definition cache loaded");

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        })
    }

    /// Load the cache at `path`, falling back to an empty cache when the
    /// backing file cannot be read. The broken file is left untouched until
    /// the next successful flush replaces it.
    pub fn open(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(error = %e, "definition cache unusable, starting empty");
                Self::empty(path)
            }
        }
    }

    /// An empty cache that will persist to `path`.
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Return the stored definition for `term`, if any.
    pub fn lookup(&self, term: &str) -> Option<&str> {
        self.entries.get(term).map(String::as_str)
    }

    /// Store (or overwrite) the definition for `term`.
    pub fn insert(&mut self, term: impl Into<String>, definition: impl Into<String>) {
        let term = term.into();
        let definition = definition.into();
        if self.entries.get(&term) != Some(&definition) {
            self.entries.insert(term, definition);
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether entries were inserted since the last load or flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist all entries if anything changed since the last flush.
    ///
    /// The file is replaced atomically, so a failed flush leaves the
    /// previously persisted contents intact.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            debug!(path = ?self.path, "definition cache unchanged, skipping flush");
            return Ok(());
        }

        let flush_err = |message: String| TermDeckError::CacheFlush {
            path: self.path.clone(),
            message,
        };

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| flush_err(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| flush_err(e.to_string()))?;

        write_atomic(&self.path, json.as_bytes()).map_err(|e| flush_err(e.to_string()))?;

        self.dirty = false;
        info!(path = ?self.path, entries = self.entries.len(), "definition cache flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("definition_cache.json")
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FetchCache::load(&cache_path(&dir)).expect("load");
        assert!(cache.is_empty());
        assert!(!cache.is_dirty());
    }

    #[test]
    fn insert_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = FetchCache::open(&cache_path(&dir));
        assert!(cache.lookup("pivot").is_none());

        cache.insert("pivot", "A change in strategy.");
        assert_eq!(cache.lookup("pivot"), Some("A change in strategy."));
        assert!(cache.is_dirty());
    }

    #[test]
    fn insert_overwrites_without_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = FetchCache::open(&cache_path(&dir));
        cache.insert("pivot", "old");
        cache.insert("pivot", "new");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("pivot"), Some("new"));
    }

    #[test]
    fn lookup_is_exact_string() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = FetchCache::open(&cache_path(&dir));
        cache.insert("MVP", "Minimum viable product.");
        assert!(cache.lookup("mvp").is_none());
        assert!(cache.lookup("MVP ").is_none());
    }

    #[test]
    fn flush_then_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);

        let mut first = FetchCache::open(&path);
        first.insert("runway", "Months of cash left.");
        first.insert("churn", "Rate at which customers leave.\nMeasured monthly.");
        first.flush().expect("flush");
        assert!(!first.is_dirty());
        drop(first);

        let second = FetchCache::load(&path).expect("reload");
        assert_eq!(second.len(), 2);
        assert_eq!(second.lookup("runway"), Some("Months of cash left."));
        assert_eq!(
            second.lookup("churn"),
            Some("Rate at which customers leave.\nMeasured monthly.")
        );
    }

    #[test]
    fn flush_writes_plain_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);
        let mut cache = FetchCache::open(&path);
        cache.insert("Юнит-экономика", "Доход и расходы на единицу.");
        cache.flush().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["Юнит-экономика"], "Доход и расходы на единицу.");
    }

    #[test]
    fn clean_cache_does_not_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);
        let mut cache = FetchCache::open(&path);
        cache.flush().expect("flush");
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);
        std::fs::write(&path, "{ not json").unwrap();

        let err = FetchCache::load(&path).unwrap_err();
        assert!(matches!(err, TermDeckError::CacheLoad { .. }));
    }

    #[test]
    fn open_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);
        std::fs::write(&path, r#"["not", "an", "object"]"#).unwrap();

        let mut cache = FetchCache::open(&path);
        assert!(cache.is_empty());

        cache.insert("seed round", "Early funding.");
        cache.flush().expect("flush replaces corrupt file");
        let reloaded = FetchCache::load(&path).expect("reload");
        assert_eq!(reloaded.lookup("seed round"), Some("Early funding."));
    }

    #[test]
    fn flush_into_missing_directory_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let mut cache = FetchCache::open(&path);
        cache.insert("cap table", "Ownership ledger.");
        cache.flush().expect("flush");
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn flushed_file_is_not_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.json");
        std::fs::write(&plain, b"{}").unwrap();

        let path = cache_path(&dir);
        let mut cache = FetchCache::open(&path);
        cache.insert("TAM", "Total addressable market.");
        cache.flush().expect("flush");

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&plain));
    }
}
