//! Layered configuration resolution: compiled-in defaults, overridden by
//! `pyproject.toml`'s `[tool.raiseattention]` / `[tool.raiseattention.analysis]`
//! tables, overridden by `.raiseattention.toml`, overridden last by CLI
//! flags.

mod config;
mod discovery;
mod error;
mod partial;

pub use config::{defaults, Config};
pub use discovery::{load_dotfile_layer, load_pyproject_layer};
pub use error::ConfigError;
pub use partial::PartialConfig;

use std::path::Path;

/// Discovers and folds every layer for `project_root`, with `cli_layer` as
/// the highest-priority, caller-supplied layer. This is the entry point the
/// CLI and the LSP server both use to get from "a directory" to a resolved
/// [`Config`].
pub fn resolve_for_project(project_root: &Path, cli_layer: PartialConfig) -> Result<Config, ConfigError> {
    let pyproject_layer = load_pyproject_layer(project_root)?;
    let dotfile_layer = load_dotfile_layer(project_root)?;
    Config::resolve(pyproject_layer, dotfile_layer, cli_layer)
}
