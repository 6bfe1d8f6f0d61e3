//! Explicitly owned cache of built term graphs.
//!
//! The store maps a [`CacheKey`] (SHA-256 over the serialized build inputs)
//! to a JSON file holding the graph's root and terms. Cached graphs are
//! rebuilt through [`TermGraph::build`] on load, so a cache hit is validated
//! exactly like a fresh build. Cache failures never fail a run: unreadable
//! or corrupt entries are logged and rebuilt.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::graph::TermGraph;
use crate::model::OntologyTerm;

/// Errors raised by [`OntologyStore`] maintenance operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("cache I/O failed at {path}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Build inputs could not be serialized into a key.
    #[error("cannot serialize cache key input")]
    Encode(#[from] serde_json::Error),
}

/// Content hash identifying one graph build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hashes the JSON serialization of `inputs`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] if `inputs` cannot be serialized.
    pub fn of<T: Serialize + ?Sized>(inputs: &T) -> Result<Self, StoreError> {
        let bytes = serde_json::to_vec(inputs)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedGraph {
    root: String,
    terms: Vec<OntologyTerm>,
}

/// Graph cache rooted at an optional directory. Without a directory every
/// call builds.
#[derive(Debug, Clone, Default)]
pub struct OntologyStore {
    cache_dir: Option<PathBuf>,
}

impl OntologyStore {
    /// Creates a store caching under `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: Some(cache_dir.into()),
        }
    }

    /// Creates a store that never caches.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Cache directory, if caching is enabled.
    #[must_use]
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    fn entry_path(&self, key: &CacheKey) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", key.as_str())))
    }

    /// Returns the cached graph for `key`, or runs `build` and caches its
    /// result.
    ///
    /// # Errors
    ///
    /// Propagates the error of `build`; cache problems only log.
    pub fn load_or_build<F, E>(&self, key: &CacheKey, build: F) -> Result<TermGraph, E>
    where
        F: FnOnce() -> Result<TermGraph, E>,
    {
        let Some(path) = self.entry_path(key) else {
            return build();
        };

        if path.exists() {
            match read_entry(&path) {
                Ok(graph) => {
                    debug!(path = %path.display(), terms = graph.len(), "term graph cache hit");
                    return Ok(graph);
                }
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "ignoring unusable cache entry");
                }
            }
        }

        let graph = build()?;
        if let Err(reason) = write_entry(&path, &graph) {
            warn!(path = %path.display(), %reason, "could not write cache entry");
        } else {
            info!(path = %path.display(), terms = graph.len(), "cached term graph");
        }
        Ok(graph)
    }

    /// Deletes all cache entries and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be listed or an
    /// entry cannot be removed.
    pub fn invalidate(&self) -> Result<usize, StoreError> {
        let Some(dir) = &self.cache_dir else {
            return Ok(0);
        };
        if !dir.exists() {
            return Ok(0);
        }
        let io = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };
        let mut removed = 0;
        for entry in fs::read_dir(dir).map_err(io(dir))? {
            let path = entry.map_err(io(dir))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).map_err(io(&path))?;
                removed += 1;
            }
        }
        info!(dir = %dir.display(), removed, "cleared term graph cache");
        Ok(removed)
    }
}

fn read_entry(path: &Path) -> Result<TermGraph, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let cached: CachedGraph = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    TermGraph::build(cached.terms, &cached.root).map_err(|e| e.to_string())
}

fn write_entry(path: &Path, graph: &TermGraph) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let cached = CachedGraph {
        root: graph.root_id().to_owned(),
        terms: graph.to_terms(),
    };
    let text = serde_json::to_string(&cached).map_err(|e| e.to_string())?;
    fs::write(path, text).map_err(|e| e.to_string())
}
