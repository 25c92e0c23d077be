//! The two-tier on-disk cache: a file-level tier keyed by `(path, content
//! hash)` storing Syntax-Visitor output, and a signature-level tier keyed
//! by `(function, module hash, dependency signatures hash)` storing
//! [`raiseattention_model::ExceptionSet`]s.

mod cache;
mod error;
mod file_tier;
mod key;
mod layout;
mod lock;
mod signature_tier;
mod time;

pub use cache::{AnalysisCache, CacheOptions, CacheStatus, PruneReport};
pub use error::CacheError;
pub use file_tier::{FileCacheEntry, FileSummary, FileTier};
pub use key::{sha256_hex, FileCacheKey, SignatureCacheKey};
pub use layout::{CacheLayout, CacheMetadata, CACHE_FORMAT_VERSION};
pub use lock::CacheLock;
pub use signature_tier::SignatureTier;
