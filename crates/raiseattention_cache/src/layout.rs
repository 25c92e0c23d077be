use std::fs;
use std::path::{Path, PathBuf};

use etcetera::{choose_app_strategy, AppStrategy, AppStrategyArgs};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Bumped whenever the on-disk entry encoding changes incompatibly; a
/// mismatch is treated the same as any other corruption: invalidate and
/// rebuild.
pub const CACHE_FORMAT_VERSION: u32 = 1;

const FILE_INDEX_NAME: &str = "files/index.json";
const FILE_ENTRIES_DIR: &str = "files/entries";
const SIGNATURE_INDEX_NAME: &str = "signatures/index.json";
const SIGNATURE_ENTRIES_DIR: &str = "signatures/entries";
const METADATA_NAME: &str = "metadata.json";

/// The small on-disk file recording format/tool version and a live entry
/// count. Rewritten after every mutating operation; read by `cache status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub format_version: u32,
    pub tool_version: String,
    pub entry_count: usize,
}

impl CacheMetadata {
    #[must_use]
    fn new(entry_count: usize) -> Self {
        Self {
            format_version: CACHE_FORMAT_VERSION,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            entry_count,
        }
    }
}

/// One project's resolved cache directory and the fixed paths within it:
/// a small metadata file plus a content-addressed store of serialized
/// entries, one directory per project.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Resolves the cache directory for `project_key` (typically the
    /// canonicalized project root path) using the platform cache-dir
    /// convention, unless `override_dir` is given by configuration.
    pub fn resolve(project_key: &str, override_dir: Option<&Path>) -> Result<Self, CacheError> {
        let root = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                let strategy = choose_app_strategy(AppStrategyArgs {
                    top_level_domain: "dev".to_string(),
                    author: "raiseattention".to_string(),
                    app_name: "raiseattention".to_string(),
                })
                .map_err(|_| CacheError::NoCacheDir)?;
                strategy.cache_dir().join(project_slug(project_key))
            }
        };
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_index_path(&self) -> PathBuf {
        self.root.join(FILE_INDEX_NAME)
    }

    pub fn file_entry_path(&self, digest: &str) -> PathBuf {
        self.root.join(FILE_ENTRIES_DIR).join(digest)
    }

    pub fn file_entries_dir(&self) -> PathBuf {
        self.root.join(FILE_ENTRIES_DIR)
    }

    pub fn signature_index_path(&self) -> PathBuf {
        self.root.join(SIGNATURE_INDEX_NAME)
    }

    pub fn signature_entry_path(&self, digest: &str) -> PathBuf {
        self.root.join(SIGNATURE_ENTRIES_DIR).join(digest)
    }

    pub fn signature_entries_dir(&self) -> PathBuf {
        self.root.join(SIGNATURE_ENTRIES_DIR)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_NAME)
    }

    /// Creates every directory this layout names, idempotently.
    pub fn ensure_dirs(&self) -> Result<(), CacheError> {
        for dir in [self.file_entries_dir(), self.signature_entries_dir()] {
            fs::create_dir_all(&dir).map_err(|source| CacheError::Io { path: dir, source })?;
        }
        Ok(())
    }

    pub fn read_metadata(&self) -> Result<Option<CacheMetadata>, CacheError> {
        let path = self.metadata_path();
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .or_else(|err| {
                    log::warn!("discarding corrupt cache metadata at {}: {err}", path.display());
                    Ok(None)
                }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    pub fn write_metadata(&self, entry_count: usize) -> Result<(), CacheError> {
        let path = self.metadata_path();
        let metadata = CacheMetadata::new(entry_count);
        let bytes = serde_json::to_vec_pretty(&metadata)
            .expect("CacheMetadata serializes without error");
        fs::write(&path, bytes).map_err(|source| CacheError::Io { path, source })
    }

    /// Removes the entire cache directory (`cache clear`).
    pub fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io {
                path: self.root.clone(),
                source,
            }),
        }
    }
}

fn project_slug(project_key: &str) -> String {
    crate::key::sha256_hex(project_key.as_bytes())
}
