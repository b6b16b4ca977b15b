use crate::error::{ProcessingError, Result};
use crate::models::Dataset;
use crate::readers::KmaReader;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

struct CacheEntry {
    key: u64,
    dataset: Arc<Dataset>,
}

/// Single-entry memo of the last loaded dataset, keyed by a hash of the
/// source bytes. A different file content replaces the entry.
#[derive(Default)]
pub struct DatasetCache {
    entry: Option<CacheEntry>,
    hits: u64,
    misses: u64,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_for(bytes: &[u8]) -> u64 {
        xxh3_64(bytes)
    }

    /// Return the cached dataset for `bytes`, running `load` on a miss.
    /// A failed load leaves the previous entry untouched.
    pub fn get_or_load<F>(&mut self, bytes: &[u8], load: F) -> Result<Arc<Dataset>>
    where
        F: FnOnce(&[u8]) -> Result<Dataset>,
    {
        let key = Self::key_for(bytes);

        if let Some(entry) = self.entry.as_ref().filter(|e| e.key == key) {
            self.hits += 1;
            debug!("Dataset cache hit ({:016x})", key);
            return Ok(Arc::clone(&entry.dataset));
        }

        self.misses += 1;
        debug!("Dataset cache miss ({:016x}), loading", key);
        let dataset = Arc::new(load(bytes)?);
        self.entry = Some(CacheEntry {
            key,
            dataset: Arc::clone(&dataset),
        });
        Ok(dataset)
    }

    /// Read `path` and load it through `reader` unless its content is cached.
    pub fn load_file(&mut self, path: &Path, reader: &KmaReader) -> Result<Arc<Dataset>> {
        let bytes = std::fs::read(path).map_err(|source| ProcessingError::InputFile {
            path: path.to_path_buf(),
            source,
        })?;
        self.get_or_load(&bytes, |b| reader.read_bytes(b))
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn cached_key(&self) -> Option<u64> {
        self.entry.as_ref().map(|e| e.key)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
