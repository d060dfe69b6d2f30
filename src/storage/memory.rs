//! In-process key/value backend

use super::{entry_size, KeyValueStore};
use crate::error::{ChatBridgeError, Result};
use std::collections::BTreeMap;

/// Map-backed storage with an optional hard byte quota
///
/// Mirrors the behaviour of browser local storage closely enough for
/// tests: writes that would push the footprint past the quota fail with
/// [`ChatBridgeError::StorageQuota`] and leave the previous value intact.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage that rejects writes beyond `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            let current = self.footprint()?;
            let replaced = self
                .entries
                .get(key)
                .map(|v| entry_size(key, v))
                .unwrap_or(0);
            let projected = current - replaced + entry_size(key, value);
            if projected > quota {
                return Err(ChatBridgeError::StorageQuota(format!(
                    "writing {} would use {} of {} bytes",
                    key, projected, quota
                ))
                .into());
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn footprint(&self) -> Result<usize> {
        Ok(self.entries.iter().map(|(k, v)| entry_size(k, v)).sum())
    }
}
