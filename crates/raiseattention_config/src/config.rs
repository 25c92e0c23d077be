use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::ConfigError;
use crate::partial::PartialConfig;

/// Compiled-in defaults, the lowest-priority layer.
#[must_use]
pub fn defaults() -> PartialConfig {
    PartialConfig {
        local_only: Some(false),
        warn_native: Some(true),
        strict_mode: Some(false),
        ignore_exceptions: Some(Vec::new()),
        ignore_modules: Some(Vec::new()),
        ignore_include: Some(Vec::new()),
        ignore_exclude: Some(Vec::new()),
        exclude: Some(Vec::new()),
        cache_enabled: Some(true),
        cache_max_file_entries: Some(10_000),
        cache_ttl_hours: None,
        cache_dir: None,
    }
}

/// The fully resolved, immutable configuration an `AnalysisSession` is
/// built from. Never mutated after `resolve` returns; a changed config
/// means a new session, not an update to this one.
#[derive(Debug, Clone)]
pub struct Config {
    pub local_only: bool,
    pub warn_native: bool,
    pub strict_mode: bool,
    pub ignore_exceptions: Vec<String>,
    pub ignore_include: Vec<String>,
    pub ignore_exclude: Vec<String>,
    pub cache_enabled: bool,
    pub cache_max_file_entries: Option<usize>,
    pub cache_ttl_hours: Option<u64>,
    pub cache_dir: Option<PathBuf>,
    exclude_matcher: GlobSet,
    ignore_modules_matcher: GlobSet,
}

impl Config {
    /// Folds `defaults() ≺ pyproject_layer ≺ dotfile_layer ≺ cli_layer` and
    /// compiles the two glob-pattern keys. Any layer may be
    /// [`PartialConfig::default()`] if that source was absent.
    pub fn resolve(
        pyproject_layer: PartialConfig,
        dotfile_layer: PartialConfig,
        cli_layer: PartialConfig,
    ) -> Result<Self, ConfigError> {
        let folded = defaults()
            .overlay(pyproject_layer)
            .overlay(dotfile_layer)
            .overlay(cli_layer);

        let exclude = folded.exclude.unwrap_or_default();
        let ignore_modules = folded.ignore_modules.unwrap_or_default();
        let exclude_matcher = build_glob_set("exclude", &exclude)?;
        let ignore_modules_matcher = build_glob_set("ignore_modules", &ignore_modules)?;

        Ok(Self {
            local_only: folded.local_only.unwrap_or(false),
            warn_native: folded.warn_native.unwrap_or(true),
            strict_mode: folded.strict_mode.unwrap_or(false),
            ignore_exceptions: folded.ignore_exceptions.unwrap_or_default(),
            ignore_include: folded.ignore_include.unwrap_or_default(),
            ignore_exclude: folded.ignore_exclude.unwrap_or_default(),
            cache_enabled: folded.cache_enabled.unwrap_or(true),
            cache_max_file_entries: folded.cache_max_file_entries,
            cache_ttl_hours: folded.cache_ttl_hours,
            cache_dir: folded.cache_dir,
            exclude_matcher,
            ignore_modules_matcher,
        })
    }

    /// Whether `path` matches one of the configured `exclude` globs.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude_matcher.is_match(path)
    }

    /// Whether `dotted_module` matches one of the configured
    /// `ignore_modules` globs: a matched module is skipped entirely, as
    /// opposed to `ignore_exceptions`' per-class suppression.
    #[must_use]
    pub fn is_ignored_module(&self, dotted_module: &str) -> bool {
        self.ignore_modules_matcher.is_match(dotted_module)
    }
}

fn build_glob_set(key: &str, patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
            key: key.to_string(),
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Glob {
        key: key.to_string(),
        pattern: patterns.join(","),
        source,
    })
}
