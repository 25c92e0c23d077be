//! The Stub Store: a version-matched lookup of precomputed may-raise
//! signatures for native/opaque callees, keyed by fully-qualified name,
//! with fuzzy class-name matching as a fallback.

mod error;
mod format;
mod store;

pub use error::StubError;
pub use format::{RawClass, RawExceptionMap, RawModule, StubFile, StubMetadata};
pub use store::StubStore;

/// The stub database shipped inside the binary, as one or more JSON files
/// under a `stubs/` data directory bundled with the binary. A deployment may
/// layer a user-supplied override directory on top via
/// [`StubStore::load_dir`].
pub const BUILTIN_STUBS_JSON: &str = include_str!("../data/builtins.json");
