use std::path::PathBuf;

/// Everything that can go wrong resolving the layered configuration (spec
/// §7, §12). A malformed user config is a user-facing error, not a silent
/// degrade, since unlike a stub or cache entry there is no sensible default
/// to fall back to mid-file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as TOML: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid glob pattern {pattern:?} in {key}: {source}")]
    Glob {
        key: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
