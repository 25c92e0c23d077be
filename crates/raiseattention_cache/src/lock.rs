use std::path::{Path, PathBuf};

use fslock::LockFile;

use crate::error::CacheError;

/// Exclusive advisory lock over one cache directory: concurrent processes
/// sharing a cache directory must either back off or serialize through this
/// lock rather than racing each other's reads and writes. Held for the
/// lifetime of the owning [`crate::AnalysisCache`]; released on drop.
pub struct CacheLock {
    path: PathBuf,
    file: LockFile,
}

impl CacheLock {
    /// Acquires the lock at `<cache_root>/.lock`, blocking until available.
    pub fn acquire(cache_root: &Path) -> Result<Self, CacheError> {
        let path = cache_root.join(".lock");
        let mut file = LockFile::open(&path).map_err(|source| CacheError::Lock {
            path: path.clone(),
            source,
        })?;
        file.lock().map_err(|source| CacheError::Lock {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, file })
    }

    /// Attempts to acquire the lock without blocking; `Ok(None)` means
    /// another process currently holds it.
    pub fn try_acquire(cache_root: &Path) -> Result<Option<Self>, CacheError> {
        let path = cache_root.join(".lock");
        let mut file = LockFile::open(&path).map_err(|source| CacheError::Lock {
            path: path.clone(),
            source,
        })?;
        let acquired = file.try_lock().map_err(|source| CacheError::Lock {
            path: path.clone(),
            source,
        })?;
        if acquired {
            Ok(Some(Self { path, file }))
        } else {
            Ok(None)
        }
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            log::warn!("failed to release cache lock at {}: {err}", self.path.display());
        }
    }
}
