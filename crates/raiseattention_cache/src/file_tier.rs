use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use filetime::FileTime;
use raiseattention_model::Module;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::key::{sha256_hex, FileCacheKey};
use crate::layout::CacheLayout;
use crate::time::now_unix;

/// A module summary recorded alongside the serialized Syntax-Visitor output.
/// Kept separate from [`Module`] itself so `cache status` can report it
/// without deserializing the (larger) full entry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FileSummary {
    pub function_count: usize,
    pub call_count: usize,
}

impl FileSummary {
    #[must_use]
    pub fn of(module: &Module) -> Self {
        Self {
            function_count: module.functions.len(),
            call_count: module.functions.iter().map(|f| f.calls.len()).sum(),
        }
    }
}

/// What a successful file-tier lookup returns.
#[derive(Debug, Clone)]
pub struct FileCacheEntry {
    pub module: Module,
    pub summary: FileSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntryBlob {
    module: Module,
    summary: FileSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileIndexRecord {
    digest: String,
    content_hash: String,
    mtime_secs: i64,
    mtime_nanos: u32,
    size: u64,
    created_at: u64,
    last_accessed: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileIndex {
    /// Keyed by the analysed file's path (as given to [`FileTier::lookup`]),
    /// so a lookup can find a candidate record before it knows the content
    /// hash: invalidated by any of mtime changed, size changed, or a
    /// recomputed hash that differs.
    entries: HashMap<String, FileIndexRecord>,
}

/// The file-level cache tier: the first of the cache's two tiers, keyed on
/// a file's path and content rather than on a function's signature.
pub struct FileTier<'a> {
    layout: &'a CacheLayout,
    max_entries: Option<usize>,
    ttl: Option<Duration>,
}

impl<'a> FileTier<'a> {
    #[must_use]
    pub fn new(layout: &'a CacheLayout, max_entries: Option<usize>, ttl: Option<Duration>) -> Self {
        Self {
            layout,
            max_entries,
            ttl,
        }
    }

    /// Looks up `path`, using its current mtime/size as a fast path before
    /// falling back to a content-hash comparison. Any I/O or corruption
    /// problem degrades to `None` (a cache miss), never an error.
    #[must_use]
    pub fn lookup(&self, path: &Path) -> Option<FileCacheEntry> {
        let mut index = self.read_index().ok()?;
        let key = path.to_string_lossy().into_owned();
        let record = index.entries.get(&key)?.clone();

        let metadata = fs::metadata(path).ok()?;
        let file_time = FileTime::from_last_modification_time(&metadata);
        let mtime_unchanged =
            file_time.seconds() == record.mtime_secs && file_time.nanoseconds() == record.mtime_nanos;
        let size_unchanged = metadata.len() == record.size;

        if !(mtime_unchanged && size_unchanged) {
            let content = fs::read(path).ok()?;
            if sha256_hex(&content) != record.content_hash {
                return None;
            }
        }

        let entry_path = self.layout.file_entry_path(&record.digest);
        let bytes = fs::read(&entry_path).ok()?;
        let blob: FileEntryBlob = match bincode::deserialize(&bytes) {
            Ok(blob) => blob,
            Err(err) => {
                log::warn!("discarding corrupt file cache entry {}: {err}", entry_path.display());
                return None;
            }
        };

        if let Some(entry) = index.entries.get_mut(&key) {
            entry.last_accessed = now_unix();
            let _ = self.write_index(&index);
        }

        Some(FileCacheEntry {
            module: blob.module,
            summary: blob.summary,
        })
    }

    /// Stores `module`/`summary` for `path` whose raw bytes are `content`.
    /// Best-effort: a write failure is reported, not propagated into the
    /// analysis pipeline -- callers typically log and continue.
    pub fn insert(
        &self,
        path: &Path,
        content: &[u8],
        module: &Module,
        summary: FileSummary,
    ) -> Result<(), CacheError> {
        self.layout.ensure_dirs()?;

        let content_hash = sha256_hex(content);
        let key = FileCacheKey::new(path.to_string_lossy(), &content_hash);
        let digest = key.digest();

        let blob = FileEntryBlob {
            module: module.clone(),
            summary,
        };
        let bytes = bincode::serialize(&blob).map_err(|source| CacheError::Corrupt {
            path: self.layout.file_entry_path(&digest),
            source,
        })?;
        write_atomic(&self.layout.file_entry_path(&digest), &bytes)?;

        let metadata = fs::metadata(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_time = FileTime::from_last_modification_time(&metadata);
        let now = now_unix();

        let mut index = self.read_index().unwrap_or_default();
        index.entries.insert(
            path.to_string_lossy().into_owned(),
            FileIndexRecord {
                digest,
                content_hash,
                mtime_secs: file_time.seconds(),
                mtime_nanos: file_time.nanoseconds(),
                size: metadata.len(),
                created_at: now,
                last_accessed: now,
            },
        );
        self.evict_over_cap(&mut index);
        self.write_index(&index)?;
        Ok(())
    }

    /// Drops every entry whose source file no longer exists or whose
    /// configured TTL has elapsed (`cache prune`).
    pub fn prune(&self) -> Result<usize, CacheError> {
        let mut index = self.read_index().unwrap_or_default();
        let now = now_unix();
        let ttl_secs = self.ttl.map(|d| d.as_secs());

        let mut removed = Vec::new();
        index.entries.retain(|path, record| {
            let exists = Path::new(path).exists();
            let expired = ttl_secs.is_some_and(|ttl| now.saturating_sub(record.last_accessed) > ttl);
            let keep = exists && !expired;
            if !keep {
                removed.push(record.digest.clone());
            }
            keep
        });

        for digest in &removed {
            let _ = fs::remove_file(self.layout.file_entry_path(digest));
        }
        self.write_index(&index)?;
        Ok(removed.len())
    }

    /// Number of entries currently indexed, for `cache status`.
    pub fn entry_count(&self) -> usize {
        self.read_index().map(|i| i.entries.len()).unwrap_or(0)
    }

    /// Total on-disk size of every entry blob, for `cache status`.
    pub fn total_bytes(&self) -> u64 {
        let Ok(dir) = fs::read_dir(self.layout.file_entries_dir()) else {
            return 0;
        };
        dir.filter_map(Result::ok)
            .filter_map(|entry| entry.metadata().ok())
            .map(|m| m.len())
            .sum()
    }

    fn evict_over_cap(&self, index: &mut FileIndex) {
        let Some(cap) = self.max_entries else {
            return;
        };
        while index.entries.len() > cap {
            let Some((oldest_key, oldest_digest)) = index
                .entries
                .iter()
                .min_by_key(|(_, record)| record.last_accessed)
                .map(|(path, record)| (path.clone(), record.digest.clone()))
            else {
                break;
            };
            index.entries.remove(&oldest_key);
            let _ = fs::remove_file(self.layout.file_entry_path(&oldest_digest));
        }
    }

    fn read_index(&self) -> Result<FileIndex, CacheError> {
        let path = self.layout.file_index_path();
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| CacheError::Index { path, source }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(FileIndex::default()),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    fn write_index(&self, index: &FileIndex) -> Result<(), CacheError> {
        self.layout.ensure_dirs()?;
        let path = self.layout.file_index_path();
        let bytes = serde_json::to_vec(index).expect("FileIndex serializes without error");
        fs::write(&path, bytes).map_err(|source| CacheError::Io { path, source })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|source| CacheError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })
}
