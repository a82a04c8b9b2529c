//! Local credential cache backing the token accessor.
//! An in-process key/value map with an optional JSON snapshot file, standing
//! in for the browser-profile storage the identity provider writes its cached
//! tokens into. Entry iteration order is unspecified.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::warn;

pub struct CredentialCache {
    entries: RwLock<HashMap<String, String>>,
    snapshot: Option<PathBuf>,
}

impl CredentialCache {
    pub fn in_memory() -> Self {
        Self { entries: RwLock::new(HashMap::new()), snapshot: None }
    }

    /// Open a cache backed by a JSON snapshot file, loading existing entries
    /// if the file is present. A missing file is an empty cache, not an error.
    pub fn with_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read credential snapshot: {}", path.display()))?;
            serde_json::from_str::<HashMap<String, String>>(&raw)
                .with_context(|| format!("credential snapshot is not a JSON object of strings: {}", path.display()))?
        } else {
            HashMap::new()
        };
        Ok(Self { entries: RwLock::new(entries), snapshot: Some(path) })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn set<K: Into<String>, V: Into<String>>(&self, key: K, value: V) {
        self.entries.write().insert(key.into(), value.into());
        self.persist_best_effort();
    }

    pub fn remove(&self, key: &str) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        if removed { self.persist_best_effort(); }
        removed
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.persist_best_effort();
    }

    /// All entries as owned pairs, in no particular order.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn len(&self) -> usize { self.entries.read().len() }
    pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }

    // Snapshot write failures must not break the page flows using the cache.
    fn persist_best_effort(&self) {
        if let Err(e) = self.persist() {
            warn!(target: "storage", "credential snapshot write failed: {e}");
        }
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.snapshot else { return Ok(()); };
        let map = self.entries.read();
        let raw = serde_json::to_string_pretty(&*map)?;
        std::fs::write(path, raw)
            .with_context(|| format!("failed to write credential snapshot: {}", path.display()))?;
        Ok(())
    }
}
