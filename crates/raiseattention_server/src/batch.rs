use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use raiseattention_diagnostics::{diagnose_module, Diagnostic, DiagnosticCode, DiagnosticKind};
use raiseattention_model::{Module, ModuleKind, Position, QualName};
use raiseattention_signatures::{EngineOptions, SignatureEngine};

use crate::discovery::{derive_roots, discover_python_files, qualname_for};
use crate::error::ServerError;
use crate::session::AnalysisSession;

/// Knobs for [`run_batch`] that aren't already folded into
/// [`AnalysisSession::config`] -- purely presentational flags the CLI
/// passes straight through rather than threading via a configuration
/// layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub full_module_path: bool,
}

/// Outcome of a whole `check` run. A fatal, run-aborting problem (a
/// directory that can't be walked, a resolver I/O error against the
/// session itself) surfaces as `Err(ServerError)` instead -- exit code 2.
/// Everything else, including a per-file syntax error, becomes an ordinary
/// diagnostic in `diagnostics` -- exit code 1 if nonempty.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub diagnostics: Vec<Diagnostic>,
    pub files_analyzed: usize,
    pub files_failed: usize,
}

/// One file's parse result, cached or fresh.
pub struct ParsedFile {
    pub path: PathBuf,
    pub qualname: QualName,
    pub content: String,
    pub module: Arc<Module>,
    cache_hit: bool,
}

enum ParseOutcome {
    Parsed(ParsedFile),
    Failed(Diagnostic),
}

/// Runs the full batch pipeline: discovers `.py` files under `paths`,
/// parses them on a worker pool (cache lookups are read-only and safe from
/// any worker; cache inserts are deferred to a single serial pass
/// afterwards to avoid a lost-update race on the on-disk index), runs the
/// Signature Engine's fixpoint single-threaded over the whole assembled
/// program, then the Diagnostic Engine per file.
pub fn run_batch(
    session: &AnalysisSession,
    paths: &[PathBuf],
    options: BatchOptions,
) -> Result<BatchReport, ServerError> {
    let roots = derive_roots(paths);

    let mut discovered: Vec<PathBuf> = Vec::new();
    for path in paths {
        for file in discover_python_files(path) {
            if !session.config.is_excluded(&file) {
                discovered.push(file);
            }
        }
    }
    discovered.sort();
    discovered.dedup();

    let start = Instant::now();
    let outcomes: Vec<ParseOutcome> = discovered
        .par_iter()
        .map(|path| parse_one(session, path, &roots))
        .collect();
    log::debug!("parsed {} file(s) in {:?}", discovered.len(), start.elapsed());

    let mut parsed = Vec::with_capacity(outcomes.len());
    let mut diagnostics = Vec::new();
    let mut files_failed = 0usize;

    for outcome in outcomes {
        match outcome {
            ParseOutcome::Parsed(file) => parsed.push(file),
            ParseOutcome::Failed(diagnostic) => {
                files_failed += 1;
                diagnostics.push(diagnostic);
            }
        }
    }

    // Serial pass: write freshly-parsed entries into the file tier. Cache
    // inserts are a non-atomic read-modify-write of the on-disk index, so
    // this must not run concurrently with itself.
    if let Some(cache) = &session.cache {
        let tier = cache.file_tier();
        for file in &parsed {
            if file.cache_hit {
                continue;
            }
            let summary = raiseattention_cache::FileSummary::of(&file.module);
            if let Err(err) = tier.insert(&file.path, file.content.as_bytes(), &file.module, summary) {
                log::debug!("failed to cache {}: {err}", file.path.display());
            }
        }
    }

    let resolver = session.resolver();
    let engine = SignatureEngine::new(
        &resolver,
        &session.stubs,
        &session.config,
        EngineOptions {
            local_only: session.config.local_only,
            warn_native: session.config.warn_native,
        },
    );

    let fixpoint_start = Instant::now();
    for file in &parsed {
        engine.analyze(file.qualname.clone(), Arc::clone(&file.module));
    }
    log::debug!(
        "signature engine converged over {} root module(s) in {:?}",
        parsed.len(),
        fixpoint_start.elapsed()
    );

    let diagnostic_options = raiseattention_diagnostics::DiagnosticOptions {
        strict_mode: session.config.strict_mode,
        full_module_path: options.full_module_path,
        ignore_include: session.config.ignore_include.clone(),
        ignore_exclude: session.config.ignore_exclude.clone(),
    };

    for file in &parsed {
        let file_diagnostics = diagnose_module(
            &file.module,
            &file.qualname,
            &file.content,
            &engine,
            diagnostic_options.clone(),
        );
        diagnostics.extend(file_diagnostics);
    }

    diagnostics = filter_ignored_exceptions(diagnostics, &session.config.ignore_exceptions);
    diagnostics.sort_by(|a, b| (&a.path, a.position.line, a.position.column).cmp(&(&b.path, b.position.line, b.position.column)));

    Ok(BatchReport {
        diagnostics,
        files_analyzed: parsed.len(),
        files_failed,
    })
}

fn parse_one(session: &AnalysisSession, path: &Path, roots: &[PathBuf]) -> ParseOutcome {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            return ParseOutcome::Failed(Diagnostic::new(
                DiagnosticCode::InternalError,
                path.to_path_buf(),
                Position::new(1, 1),
                DiagnosticKind::InternalError {
                    detail: err.to_string(),
                },
            ));
        }
    };

    let qualname = qualname_for(path, roots);

    if let Some(cache) = &session.cache {
        if let Some(entry) = cache.file_tier().lookup(path) {
            log::debug!("cache hit for {}", path.display());
            return ParseOutcome::Parsed(ParsedFile {
                path: path.to_path_buf(),
                qualname,
                content,
                module: Arc::new(entry.module),
                cache_hit: true,
            });
        }
    }

    match raiseattention_visitor::visit_source(path, qualname.clone(), ModuleKind::Project, &content) {
        Ok(module) => ParseOutcome::Parsed(ParsedFile {
            path: path.to_path_buf(),
            qualname,
            content,
            module: Arc::new(module),
            cache_hit: false,
        }),
        Err(err) => ParseOutcome::Failed(Diagnostic::new(
            DiagnosticCode::InternalError,
            path.to_path_buf(),
            Position::new(1, 1),
            DiagnosticKind::InternalError {
                detail: err.to_string(),
            },
        )),
    }
}

/// Applies the `ignore_exceptions` config key as a final pass over the
/// assembled diagnostic list: there's no field for it on
/// [`raiseattention_diagnostics::DiagnosticOptions`] since it's a blunter,
/// global suppression than that engine's own `ignore_include`/
/// `ignore_exclude` built-in-filter keys, so it's applied here instead,
/// after the Diagnostic Engine has already run.
pub(crate) fn filter_ignored_exceptions(diagnostics: Vec<Diagnostic>, ignored: &[String]) -> Vec<Diagnostic> {
    if ignored.is_empty() {
        return diagnostics;
    }

    diagnostics
        .into_iter()
        .filter_map(|mut diagnostic| match &mut diagnostic.kind {
            DiagnosticKind::UnhandledException { exceptions, .. } => {
                exceptions.retain(|name| !ignored.iter().any(|ignore| ignore == name));
                (!exceptions.is_empty()).then_some(diagnostic)
            }
            DiagnosticKind::UndocumentedException { exception, .. } => {
                (!ignored.iter().any(|ignore| ignore == exception)).then_some(diagnostic)
            }
            DiagnosticKind::InternalError { .. } | DiagnosticKind::InvalidIgnoreComment => Some(diagnostic),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use raiseattention_config::PartialConfig;
    use std::fs;
    use tempfile::tempdir;

    fn session_over(dir: &Path) -> AnalysisSession {
        let mut cli_layer = PartialConfig::default();
        cli_layer.cache_dir = Some(dir.join(".cache"));
        AnalysisSession::open(dir, cli_layer).unwrap()
    }

    #[test]
    fn s1_unhandled_call_surfaces_one_diagnostic() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "def r():\n    raise ValueError(\"x\")\n\ndef c():\n    r()\n",
        )
        .unwrap();
        let session = session_over(dir.path());
        let report = run_batch(&session, &[dir.path().to_path_buf()], BatchOptions::default()).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.files_failed, 0);
    }

    #[test]
    fn syntax_error_degrades_to_internal_error_diagnostic_without_aborting() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.py"), "def (:\n").unwrap();
        fs::write(dir.path().join("good.py"), "def f():\n    pass\n").unwrap();
        let session = session_over(dir.path());
        let report = run_batch(&session, &[dir.path().to_path_buf()], BatchOptions::default()).unwrap();
        assert_eq!(report.files_failed, 1);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::InternalError { .. })));
    }

    #[test]
    fn cross_file_call_is_analysed_through_the_shared_engine() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
        fs::write(dir.path().join("pkg/b.py"), "def b():\n    raise KeyError()\n").unwrap();
        fs::write(
            dir.path().join("a.py"),
            "from pkg import b\n\ndef c():\n    b.b()\n",
        )
        .unwrap();
        let session = session_over(dir.path());
        let report = run_batch(&session, &[dir.path().to_path_buf()], BatchOptions::default()).unwrap();
        assert!(report
            .diagnostics
            .iter()
            .any(|d| matches!(&d.kind, DiagnosticKind::UnhandledException { exceptions, .. } if exceptions.iter().any(|e| e == "KeyError"))));
    }

    #[test]
    fn ignore_exceptions_config_key_suppresses_named_exception() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "def r():\n    raise ValueError(\"x\")\n\ndef c():\n    r()\n",
        )
        .unwrap();
        let mut cli_layer = PartialConfig::default();
        cli_layer.cache_dir = Some(dir.path().join(".cache"));
        cli_layer.ignore_exceptions = Some(vec!["ValueError".to_string()]);
        let session = AnalysisSession::open(dir.path(), cli_layer).unwrap();
        let report = run_batch(&session, &[dir.path().to_path_buf()], BatchOptions::default()).unwrap();
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn second_run_hits_the_file_cache() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();
        let session = session_over(dir.path());
        run_batch(&session, &[dir.path().to_path_buf()], BatchOptions::default()).unwrap();
        let report = run_batch(&session, &[dir.path().to_path_buf()], BatchOptions::default()).unwrap();
        assert_eq!(report.files_analyzed, 1);
    }
}
