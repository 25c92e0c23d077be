use std::path::{Path, PathBuf};

use pep440_rs::Version;
use raiseattention_cache::{AnalysisCache, CacheOptions};
use raiseattention_config::{Config, PartialConfig};
use raiseattention_resolver::{detect_venv, ExternalResolver, VenvInfo};
use raiseattention_stubs::StubStore;

use crate::error::ServerError;

/// The non-global encapsulation of process-wide state: one value, created
/// once per project root, that every batch run or LSP workspace hands its
/// analysis helpers instead of reaching for a singleton. Neither frontend
/// spins up anything -- a thread pool, a cache lock -- outside the
/// `AnalysisSession` it owns.
pub struct AnalysisSession {
    pub project_root: PathBuf,
    pub config: Config,
    pub stubs: StubStore,
    pub venv: Option<VenvInfo>,
    pub cache: Option<AnalysisCache>,
}

impl AnalysisSession {
    /// Resolves configuration for `project_root` (folding in `cli_layer`),
    /// detects a virtual environment, loads the stub database, and opens
    /// the on-disk cache unless configuration disables it.
    pub fn open(project_root: &Path, cli_layer: PartialConfig) -> Result<Self, ServerError> {
        let config = raiseattention_config::resolve_for_project(project_root, cli_layer).map_err(|source| {
            ServerError::Config {
                root: project_root.to_path_buf(),
                source,
            }
        })?;

        let venv = detect_venv(project_root);
        let python_version = venv
            .as_ref()
            .and_then(|v| v.python_version.as_deref())
            .and_then(|raw| Version::from_str(raw).ok())
            .unwrap_or_else(default_python_version);
        let stubs = StubStore::with_embedded_defaults(&python_version)?;

        let cache = if config.cache_enabled {
            let project_key = project_key_for(project_root);
            let options = CacheOptions {
                enabled: true,
                max_file_entries: config.cache_max_file_entries,
                ttl_hours: config.cache_ttl_hours,
            };
            Some(AnalysisCache::open(&project_key, config.cache_dir.as_deref(), options)?)
        } else {
            None
        };

        Ok(Self {
            project_root: project_root.to_path_buf(),
            config,
            stubs,
            venv,
            cache,
        })
    }

    /// Builds a fresh [`ExternalResolver`] rooted at this session's project
    /// root and detected virtual environment. Cheap to construct (its
    /// memoisation caches start empty) -- callers get a new one per batch
    /// run or per LSP re-analysis rather than sharing one across the
    /// session's lifetime, since the resolver's per-path cache is exactly
    /// as long-lived as the single fixpoint it feeds.
    #[must_use]
    pub fn resolver(&self) -> ExternalResolver {
        ExternalResolver::new(vec![self.project_root.clone()], None, self.venv.clone())
    }
}

use std::str::FromStr;

fn default_python_version() -> Version {
    Version::from_str("3.12").expect("3.12 is a valid PEP 440 version")
}

/// A stable, filesystem-safe key identifying `project_root`'s cache
/// directory, so two different projects never collide under the same
/// platform cache root.
fn project_key_for(project_root: &Path) -> String {
    let canonical = project_root.canonicalize().unwrap_or_else(|_| project_root.to_path_buf());
    raiseattention_cache::sha256_hex(canonical.to_string_lossy().as_bytes())
}
