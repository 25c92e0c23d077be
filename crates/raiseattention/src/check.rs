use std::path::{Path, PathBuf};
use std::process::ExitCode;

use raiseattention_config::PartialConfig;
use raiseattention_server::{run_batch, AnalysisSession, BatchOptions};

use crate::cli::CheckArgs;
use crate::report;

/// `raiseattention check`: builds a CLI-layer [`PartialConfig`] from only
/// the flags the caller actually passed -- an unset flag must never
/// overwrite a lower layer's value with a default -- opens an
/// [`AnalysisSession`] rooted at the first path's directory, runs the
/// batch pipeline, and renders the result.
pub fn run(args: CheckArgs) -> anyhow::Result<ExitCode> {
    let paths = if args.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.paths.clone()
    };

    let project_root = project_root_for(&paths);

    let mut cli_layer = PartialConfig::default();
    if args.local {
        cli_layer.local_only = Some(true);
    }
    if args.strict {
        cli_layer.strict_mode = Some(true);
    }
    if args.no_warn_native {
        cli_layer.warn_native = Some(false);
    }
    if args.no_cache {
        cli_layer.cache_enabled = Some(false);
    }

    let session = AnalysisSession::open(&project_root, cli_layer)?;
    let report = run_batch(
        &session,
        &paths,
        BatchOptions {
            full_module_path: args.full_module_path,
        },
    )?;

    report::render(&report, args.json, args.absolute)
}

/// Configuration discovery (`pyproject.toml`/`.raiseattention.toml` search)
/// needs a single root to start from; a multi-path invocation spanning
/// more than one project resolves config from the first path given, same
/// as passing all of them to a single project's `check` would. Recorded
/// as an open-question resolution in the design ledger.
fn project_root_for(paths: &[PathBuf]) -> PathBuf {
    let first = &paths[0];
    let root = if first.is_dir() {
        first.clone()
    } else {
        first.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    };
    root.canonicalize().unwrap_or(root)
}
