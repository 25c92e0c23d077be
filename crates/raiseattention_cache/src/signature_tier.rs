use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use raiseattention_model::ExceptionSet;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::key::SignatureCacheKey;
use crate::layout::CacheLayout;
use crate::time::now_unix;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignatureIndexRecord {
    digest: String,
    created_at: u64,
    last_accessed: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SignatureIndex {
    /// Keyed by the combined digest directly: unlike the file tier, every
    /// key component is already known at lookup time, so no path-keyed
    /// fast path is needed -- a changed component simply produces a
    /// different digest, which is itself the invalidation.
    entries: HashMap<String, SignatureIndexRecord>,
}

/// The signature-level cache tier: keyed by a function's qualname, its
/// module's content hash, and a hash of its transitive dependencies'
/// signatures, so a change anywhere upstream produces a different digest.
pub struct SignatureTier<'a> {
    layout: &'a CacheLayout,
    ttl: Option<Duration>,
}

impl<'a> SignatureTier<'a> {
    #[must_use]
    pub fn new(layout: &'a CacheLayout, ttl: Option<Duration>) -> Self {
        Self { layout, ttl }
    }

    #[must_use]
    pub fn lookup(&self, key: &SignatureCacheKey) -> Option<ExceptionSet> {
        let digest = key.digest();
        let mut index = self.read_index().ok()?;
        let record = index.entries.get(&digest)?.clone();

        let entry_path = self.layout.signature_entry_path(&record.digest);
        let bytes = fs::read(&entry_path).ok()?;
        let set: ExceptionSet = match bincode::deserialize(&bytes) {
            Ok(set) => set,
            Err(err) => {
                log::warn!(
                    "discarding corrupt signature cache entry {}: {err}",
                    entry_path.display()
                );
                return None;
            }
        };

        if let Some(entry) = index.entries.get_mut(&digest) {
            entry.last_accessed = now_unix();
            let _ = self.write_index(&index);
        }
        Some(set)
    }

    pub fn insert(&self, key: &SignatureCacheKey, set: &ExceptionSet) -> Result<(), CacheError> {
        self.layout.ensure_dirs()?;
        let digest = key.digest();
        let bytes = bincode::serialize(set).map_err(|source| CacheError::Corrupt {
            path: self.layout.signature_entry_path(&digest),
            source,
        })?;
        let path = self.layout.signature_entry_path(&digest);
        fs::write(&path, bytes).map_err(|source| CacheError::Io { path, source })?;

        let now = now_unix();
        let mut index = self.read_index().unwrap_or_default();
        index.entries.insert(
            digest.clone(),
            SignatureIndexRecord {
                digest,
                created_at: now,
                last_accessed: now,
            },
        );
        self.write_index(&index)?;
        Ok(())
    }

    /// Drops entries whose TTL has elapsed. Signature-tier entries have no
    /// source file of their own to check for existence -- they are
    /// reachable only by recomputing the same key, so staleness is purely
    /// TTL-driven here, unlike the file tier's existence check; `cache
    /// prune` still walks both tiers.
    pub fn prune(&self) -> Result<usize, CacheError> {
        let Some(ttl) = self.ttl else {
            return Ok(0);
        };
        let mut index = self.read_index().unwrap_or_default();
        let now = now_unix();
        let ttl_secs = ttl.as_secs();

        let mut removed = Vec::new();
        index.entries.retain(|_, record| {
            let expired = now.saturating_sub(record.last_accessed) > ttl_secs;
            if expired {
                removed.push(record.digest.clone());
            }
            !expired
        });

        for digest in &removed {
            let _ = fs::remove_file(self.layout.signature_entry_path(digest));
        }
        self.write_index(&index)?;
        Ok(removed.len())
    }

    pub fn entry_count(&self) -> usize {
        self.read_index().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn total_bytes(&self) -> u64 {
        let Ok(dir) = fs::read_dir(self.layout.signature_entries_dir()) else {
            return 0;
        };
        dir.filter_map(Result::ok)
            .filter_map(|entry| entry.metadata().ok())
            .map(|m| m.len())
            .sum()
    }

    fn read_index(&self) -> Result<SignatureIndex, CacheError> {
        let path = self.layout.signature_index_path();
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| CacheError::Index { path, source }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SignatureIndex::default()),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    fn write_index(&self, index: &SignatureIndex) -> Result<(), CacheError> {
        self.layout.ensure_dirs()?;
        let path = self.layout.signature_index_path();
        let bytes = serde_json::to_vec(index).expect("SignatureIndex serializes without error");
        fs::write(&path, bytes).map_err(|source| CacheError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raiseattention_model::Confidence;
    use tempfile::tempdir;

    #[test]
    fn insert_then_lookup_round_trips() {
        let dir = tempdir().unwrap();
        let layout = CacheLayout::resolve("proj", Some(dir.path())).unwrap();
        let tier = SignatureTier::new(&layout, None);

        let key = SignatureCacheKey::new("m::f", "h1", "h2");
        let mut set = ExceptionSet::new();
        set.insert("ValueError", Confidence::Exact);
        tier.insert(&key, &set).unwrap();

        let found = tier.lookup(&key).expect("cache hit");
        assert_eq!(found, set);
    }

    #[test]
    fn lookup_misses_when_any_key_component_changes() {
        let dir = tempdir().unwrap();
        let layout = CacheLayout::resolve("proj", Some(dir.path())).unwrap();
        let tier = SignatureTier::new(&layout, None);

        let key = SignatureCacheKey::new("m::f", "h1", "h2");
        let set = ExceptionSet::single("ValueError", Confidence::Exact);
        tier.insert(&key, &set).unwrap();

        let changed = SignatureCacheKey::new("m::f", "h1", "h3");
        assert!(tier.lookup(&changed).is_none());
    }
}
