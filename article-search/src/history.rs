//! Bounded recent-search history mirrored to a [`HistoryStore`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RECENT: usize = 10;

/// Durable storage for the history list.
pub trait HistoryStore: Send + Sync + 'static {
    fn load(&self) -> Result<Vec<String>>;
    fn save(&self, entries: &[String]) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct HistoryFile {
    recent_searches: Vec<String>,
}

/// JSON file store. A missing or unreadable file loads as empty history.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self) -> Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let file: HistoryFile = serde_json::from_str(&content)
                    .with_context(|| format!("parsing {}", self.path.display()))?;
                Ok(file.recent_searches)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn save(&self, entries: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = HistoryFile {
            recent_searches: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))
    }
}

/// Process-local store, for tests and headless use.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<String>>,
}

impl MemoryHistoryStore {
    pub fn with_entries(entries: Vec<String>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<String>> {
        Ok(self.snapshot())
    }

    fn save(&self, entries: &[String]) -> Result<()> {
        *self.entries.lock().unwrap_or_else(|e| e.into_inner()) = entries.to_vec();
        Ok(())
    }
}

#[derive(Debug)]
pub struct RecentSearches<S: HistoryStore> {
    store: S,
    entries: Vec<String>,
    max_len: usize,
}

impl<S: HistoryStore> RecentSearches<S> {
    /// Loads persisted history, normalizing it to the current bound.
    pub fn load(store: S, max_len: usize) -> Self {
        let max_len = max_len.max(1);
        let stored = store.load().unwrap_or_else(|e| {
            warn!("Failed to load recent searches: {:#}", e);
            Vec::new()
        });
        let mut history = Self {
            store,
            entries: Vec::with_capacity(max_len),
            max_len,
        };
        // Replay oldest first so the stored order survives deduplication.
        for term in stored.iter().rev() {
            history.insert(term);
        }
        history
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Moves `term` to the front. Blank terms are ignored.
    pub fn add(&mut self, term: &str) -> bool {
        if !self.insert(term) {
            return false;
        }
        self.persist();
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    fn insert(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        let lowered = term.to_lowercase();
        self.entries.retain(|e| e.to_lowercase() != lowered);
        self.entries.insert(0, term.to_string());
        self.entries.truncate(self.max_len);
        true
    }

    fn persist(&self) {
        match self.store.save(&self.entries) {
            Ok(()) => debug!("Persisted {} recent searches", self.entries.len()),
            Err(e) => warn!("Failed to persist recent searches: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_prepends() {
        let mut history = RecentSearches::load(MemoryHistoryStore::default(), 10);
        history.add("oak");
        history.add("concrete");
        assert_eq!(history.entries(), strings(&["concrete", "oak"]).as_slice());
    }

    #[test]
    fn test_dedup_case_insensitive_moves_to_front() {
        let mut history = RecentSearches::load(MemoryHistoryStore::default(), 10);
        history.add("oak");
        history.add("concrete");
        history.add("OAK");
        assert_eq!(history.entries(), strings(&["OAK", "concrete"]).as_slice());
    }

    #[test]
    fn test_bounded_length() {
        let mut history = RecentSearches::load(MemoryHistoryStore::default(), 3);
        for term in ["a1", "a2", "a3", "a4", "a5"] {
            history.add(term);
            assert!(history.entries().len() <= 3);
        }
        assert_eq!(history.entries(), strings(&["a5", "a4", "a3"]).as_slice());
    }

    #[test]
    fn test_blank_terms_ignored() {
        let mut history = RecentSearches::load(MemoryHistoryStore::default(), 3);
        assert!(!history.add("   "));
        assert!(history.entries().is_empty());
        assert!(history.add("  oak "));
        assert_eq!(history.entries(), strings(&["oak"]).as_slice());
    }

    #[test]
    fn test_load_normalizes_stored_list() {
        let store = MemoryHistoryStore::with_entries(strings(&["oak", "Oak", "tile", "glass"]));
        let history = RecentSearches::load(store, 2);
        assert_eq!(history.entries(), strings(&["oak", "tile"]).as_slice());
    }

    #[test]
    fn test_clear_empties_store() {
        let mut history = RecentSearches::load(MemoryHistoryStore::default(), 5);
        history.add("oak");
        history.clear();
        assert!(history.entries().is_empty());
        assert!(history.store.snapshot().is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("recent.json");

        let mut history = RecentSearches::load(FileHistoryStore::new(&path), 10);
        assert!(history.entries().is_empty());
        history.add("oak floor");
        history.add("brutalism");

        let reloaded = RecentSearches::load(FileHistoryStore::new(&path), 10);
        assert_eq!(reloaded.entries(), strings(&["brutalism", "oak floor"]).as_slice());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("recent.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileHistoryStore::new(&path);
        assert!(store.load().is_err());
        let history = RecentSearches::load(store, 10);
        assert!(history.entries().is_empty());
    }
}
