use std::path::PathBuf;

/// Everything that can go wrong touching the on-disk cache. Corruption is
/// invalidate-and-rebuild, never fatal -- callers that hit a lookup path
/// treat any of these as a miss and log at debug/warn; only the explicit
/// `cache status|clear|prune` commands surface them to the user.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to access cache path {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to acquire advisory lock at {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt cache entry at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("corrupt cache index at {path}: {source}")]
    Index {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no platform cache directory could be determined for this project")]
    NoCacheDir,
}
