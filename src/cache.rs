//! Persistent translation memory.
//!
//! Maps cleaned source lines to their translations so repeated lines across
//! scripts (and across runs) never hit the backend twice. Shared by all
//! workers behind a single mutex.

use crate::error::CacheError;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Thread-safe source-to-translation map backed by a JSON file.
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: Mutex<HashMap<String, String>>,
}

impl TranslationCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-filled with `entries`.
    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Loads the cache from `path`.
    ///
    /// A missing, unreadable or malformed file yields an empty cache.
    pub fn load(path: &Path) -> Self {
        let entries = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<HashMap<String, String>>(&content).ok())
            .unwrap_or_default();

        Self::from_entries(entries)
    }

    /// Returns the cached translation for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Stores a translation. Repeated puts of the same key are harmless.
    pub fn put(&self, key: String, value: String) {
        self.lock().insert(key, value);
    }

    /// Number of cached translations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Writes every entry to `path` as pretty-printed JSON.
    ///
    /// The data goes to a sibling temporary file first and is then renamed
    /// over `path`, so an interrupted save leaves the previous file intact.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let content = {
            let entries = self.lock();
            serde_json::to_string_pretty(&*entries)?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = temp_path(path);
        let result =
            write_synced(&tmp, content.as_bytes()).and_then(|()| std::fs::rename(&tmp, path));
        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// A poisoned lock only means another worker panicked mid-insert; the map
    /// itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Writes `data` and flushes it to disk before returning.
fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Returns `<path>.tmp` next to `path`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
