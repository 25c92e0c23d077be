use std::path::Path;
use std::time::Duration;

use crate::error::CacheError;
use crate::file_tier::FileTier;
use crate::layout::CacheLayout;
use crate::lock::CacheLock;
use crate::signature_tier::SignatureTier;

/// Cache-layer knobs (`enabled`, `max_file_entries`, `ttl_hours`),
/// resolved from [`raiseattention_config`] by the caller.
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub enabled: bool,
    pub max_file_entries: Option<usize>,
    pub ttl_hours: Option<u64>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_file_entries: Some(10_000),
            ttl_hours: None,
        }
    }
}

/// One process's view of the on-disk cache for one project: owns the
/// advisory lock and both tiers.
pub struct AnalysisCache {
    layout: CacheLayout,
    _lock: Option<CacheLock>,
    ttl: Option<Duration>,
    max_file_entries: Option<usize>,
}

impl AnalysisCache {
    /// Opens (creating if absent) the cache directory for `project_key`,
    /// acquiring its exclusive advisory lock. `override_dir` corresponds to
    /// a configured cache-directory override.
    pub fn open(
        project_key: &str,
        override_dir: Option<&Path>,
        options: CacheOptions,
    ) -> Result<Self, CacheError> {
        let layout = CacheLayout::resolve(project_key, override_dir)?;
        layout.ensure_dirs()?;
        let lock = CacheLock::acquire(layout.root())?;
        Ok(Self {
            layout,
            _lock: Some(lock),
            ttl: options.ttl_hours.map(|hours| Duration::from_secs(hours.saturating_mul(3600))),
            max_file_entries: options.max_file_entries,
        })
    }

    #[must_use]
    pub fn file_tier(&self) -> FileTier<'_> {
        FileTier::new(&self.layout, self.max_file_entries, self.ttl)
    }

    #[must_use]
    pub fn signature_tier(&self) -> SignatureTier<'_> {
        SignatureTier::new(&self.layout, self.ttl)
    }

    /// `cache status`: entry counts and on-disk size per tier.
    #[must_use]
    pub fn status(&self) -> CacheStatus {
        let files = self.file_tier();
        let signatures = self.signature_tier();
        CacheStatus {
            root: self.layout.root().to_path_buf(),
            file_entries: files.entry_count(),
            file_bytes: files.total_bytes(),
            signature_entries: signatures.entry_count(),
            signature_bytes: signatures.total_bytes(),
        }
    }

    /// `cache clear`: removes the whole cache directory. The
    /// lock must be dropped first since it holds a file inside that
    /// directory open.
    pub fn clear(self) -> Result<(), CacheError> {
        let layout = self.layout.clone();
        drop(self);
        layout.clear()
    }

    /// `cache prune`: drops entries whose source file no
    /// longer exists or whose TTL has elapsed. Returns the number removed
    /// from each tier.
    pub fn prune(&self) -> Result<PruneReport, CacheError> {
        let file_removed = self.file_tier().prune()?;
        let signature_removed = self.signature_tier().prune()?;
        self.write_metadata()?;
        Ok(PruneReport {
            file_removed,
            signature_removed,
        })
    }

    pub fn write_metadata(&self) -> Result<(), CacheError> {
        let total = self.file_tier().entry_count() + self.signature_tier().entry_count();
        self.layout.write_metadata(total)
    }
}

/// Result of [`AnalysisCache::status`].
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub root: std::path::PathBuf,
    pub file_entries: usize,
    pub file_bytes: u64,
    pub signature_entries: usize,
    pub signature_bytes: u64,
}

/// Result of [`AnalysisCache::prune`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PruneReport {
    pub file_removed: usize,
    pub signature_removed: usize,
}

impl PruneReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.file_removed + self.signature_removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn status_reports_zero_for_fresh_cache() {
        let dir = tempdir().unwrap();
        let cache = AnalysisCache::open("proj", Some(dir.path()), CacheOptions::default()).unwrap();
        let status = cache.status();
        assert_eq!(status.file_entries, 0);
        assert_eq!(status.signature_entries, 0);
    }

    #[test]
    fn clear_removes_the_cache_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("cache");
        let cache = AnalysisCache::open("proj", Some(&root), CacheOptions::default()).unwrap();
        cache.write_metadata().unwrap();
        assert!(root.exists());
        let cache = AnalysisCache::open("proj", Some(&root), CacheOptions::default()).unwrap();
        cache.clear().unwrap();
        assert!(!root.exists());
    }
}
