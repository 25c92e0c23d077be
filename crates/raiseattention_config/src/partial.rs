use std::path::PathBuf;

use serde::Deserialize;

/// One configuration layer. Every field is `Option` so a layer that never
/// mentions a key doesn't clobber a lower layer's value when folded.
///
/// Deliberately *not* `#[serde(deny_unknown_fields)]`: a `pyproject.toml`
/// `[tool.raiseattention]` table may carry sibling keys this tool doesn't
/// recognise yet (a future version, a typo a linter will catch elsewhere);
/// ignoring them rather than erroring treats this as table extraction, not
/// a full pyproject.toml semantic model.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    pub local_only: Option<bool>,
    pub warn_native: Option<bool>,
    pub strict_mode: Option<bool>,
    pub ignore_exceptions: Option<Vec<String>>,
    pub ignore_modules: Option<Vec<String>>,
    pub ignore_include: Option<Vec<String>>,
    pub ignore_exclude: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub cache_enabled: Option<bool>,
    pub cache_max_file_entries: Option<usize>,
    pub cache_ttl_hours: Option<u64>,
    /// The cache directory override, left unset (platform default) unless
    /// a layer names it.
    pub cache_dir: Option<PathBuf>,
}

impl PartialConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Right-biased overlay: every field `higher` sets wins; fields
    /// `higher` leaves `None` fall through to `self`.
    #[must_use]
    pub fn overlay(self, higher: PartialConfig) -> PartialConfig {
        PartialConfig {
            local_only: higher.local_only.or(self.local_only),
            warn_native: higher.warn_native.or(self.warn_native),
            strict_mode: higher.strict_mode.or(self.strict_mode),
            ignore_exceptions: higher.ignore_exceptions.or(self.ignore_exceptions),
            ignore_modules: higher.ignore_modules.or(self.ignore_modules),
            ignore_include: higher.ignore_include.or(self.ignore_include),
            ignore_exclude: higher.ignore_exclude.or(self.ignore_exclude),
            exclude: higher.exclude.or(self.exclude),
            cache_enabled: higher.cache_enabled.or(self.cache_enabled),
            cache_max_file_entries: higher.cache_max_file_entries.or(self.cache_max_file_entries),
            cache_ttl_hours: higher.cache_ttl_hours.or(self.cache_ttl_hours),
            cache_dir: higher.cache_dir.or(self.cache_dir),
        }
    }
}
