//! Class-to-file resolution cache.
//!
//! Entries are only added on success and never invalidated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// `(outer class name, expected file name)`.
pub type CacheKey = (String, Option<String>);

#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<CacheKey, PathBuf>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(outer_class_name: &str, file_name: Option<&str>) -> CacheKey {
        (outer_class_name.to_string(), file_name.map(str::to_string))
    }

    pub fn get(&self, key: &CacheKey) -> Option<PathBuf> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, path: &Path) {
        self.entries.lock().insert(key, path.to_path_buf());
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
