use std::path::PathBuf;

use raiseattention_model::{HandledSet, Module, Position, QualName};
use raiseattention_signatures::{FunctionKey, SignatureEngine};

use crate::code::DiagnosticCode;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ignore::{self, IgnoreDirective};

/// Exception short names the built-in filter rule treats as uninteresting
/// by default: common enough that flagging every bare built-in call
/// raising them would be mostly noise.
const UNINTERESTING_BUILTIN_EXCEPTIONS: &[&str] = &["TypeError", "Exception", "MemoryError"];

/// Knobs that change what the Diagnostic Engine emits: the CLI's `--strict`
/// / `--full-module-path` flags, plus the `ignore_include` / `ignore_exclude`
/// config keys.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticOptions {
    /// `--strict`: additionally emit a diagnostic for every undocumented
    /// exception in a function's full may-raise set.
    pub strict_mode: bool,
    /// `--full-module-path`: list fully-qualified exception names rather
    /// than short class names.
    pub full_module_path: bool,
    /// Config key `ignore_include`: exception short names forced into the
    /// built-in filter's uninteresting set, suppressed even if otherwise
    /// interesting.
    pub ignore_include: Vec<String>,
    /// Config key `ignore_exclude`: exception short names exempted from
    /// the built-in filter entirely, always kept. Takes precedence over
    /// `ignore_include` when a name appears in both.
    pub ignore_exclude: Vec<String>,
}

/// Whether `short_name` counts as "interesting" for the built-in filter
/// rule: by default, anything outside [`UNINTERESTING_BUILTIN_EXCEPTIONS`];
/// `ignore_exclude` always keeps it, `ignore_include` always drops it, and
/// `ignore_exclude` wins a conflict.
fn is_interesting_builtin_exception(short_name: &str, options: &DiagnosticOptions) -> bool {
    if options.ignore_exclude.iter().any(|name| name == short_name) {
        return true;
    }
    if options.ignore_include.iter().any(|name| name == short_name) {
        return false;
    }
    !UNINTERESTING_BUILTIN_EXCEPTIONS.contains(&short_name)
}

/// Whether `call` is a call to a well-known built-in name for the built-in
/// filter rule: a bare identifier (no dotted module prefix) that isn't a
/// function defined in `module` itself.
fn is_bare_builtin_call(call: &raiseattention_model::CallInfo, module: &Module) -> bool {
    let Some(callee) = &call.callee else {
        return false;
    };
    callee.segments().count() == 1 && module.find_function(callee).is_none()
}

/// Runs the Diagnostic Engine over every call site in `module`, given an
/// already-`analyze`d [`SignatureEngine`] that knows `module`'s functions
/// (and anything they transitively call). `source` is the raw file
/// contents `module` was parsed from, needed to scan for inline-ignore
/// comments.
#[must_use]
pub fn diagnose_module(
    module: &Module,
    module_path: &QualName,
    source: &str,
    engine: &SignatureEngine,
    options: DiagnosticOptions,
) -> Vec<Diagnostic> {
    let lines: Vec<&str> = source.lines().collect();
    let path = module
        .source_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(module_path.as_str()));

    let mut diagnostics = Vec::new();

    for function in &module.functions {
        let caller_key = FunctionKey::new(module_path.clone(), function.qualname.clone());

        for call in &function.calls {
            let raw = engine.raw_at_call(module, &caller_key, call);
            if raw.is_empty() {
                continue;
            }

            let handled = HandledSet::from_enclosing(&function.try_scopes, &call.enclosing_try_scopes);
            let unhandled = raw.retain_unmatched(|short| handled.covers(short));
            if unhandled.is_empty() {
                continue;
            }

            let call_lines = line_slice(&lines, call.position.line, call.end_line);
            let unhandled = match ignore::find_directive(&call_lines) {
                Some(IgnoreDirective::List(ignored)) => {
                    unhandled.retain_unmatched(|short| ignored.iter().any(|name| name == short))
                }
                Some(IgnoreDirective::BareInvalid) => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticCode::RaiseAttention,
                        path.clone(),
                        call.position,
                        DiagnosticKind::InvalidIgnoreComment,
                    ));
                    unhandled
                }
                None => unhandled,
            };
            if unhandled.is_empty() {
                continue;
            }

            let builtin_call = is_bare_builtin_call(call, module);
            let mut remaining: Vec<(String, &QualName)> = unhandled
                .iter()
                .filter(|(name, _)| !function.docstring_documents_exception(name.short_name()))
                .filter(|(name, _)| !builtin_call || is_interesting_builtin_exception(name.short_name(), &options))
                .map(|(name, _)| (display_name(name, options.full_module_path), name))
                .collect();
            if remaining.is_empty() {
                continue;
            }
            remaining.sort_by(|a, b| a.0.cmp(&b.0));
            remaining.dedup_by(|a, b| a.0 == b.0);

            let callee = call.callee.as_ref().map(QualName::as_str).unwrap_or("<unknown>").to_string();
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::UnhandledException,
                path.clone(),
                call.position,
                DiagnosticKind::UnhandledException {
                    callee,
                    exceptions: remaining.into_iter().map(|(name, _)| name).collect(),
                },
            ));
        }

        if options.strict_mode {
            diagnostics.extend(undocumented_exceptions(function, &caller_key, engine, &path));
        }
    }

    diagnostics.sort_by_key(|d| (d.position.line, d.position.column));
    diagnostics
}

fn undocumented_exceptions(
    function: &raiseattention_model::FunctionInfo,
    caller_key: &FunctionKey,
    engine: &SignatureEngine,
    path: &std::path::Path,
) -> Vec<Diagnostic> {
    let Some(signature) = engine.signature_of(caller_key) else {
        return Vec::new();
    };
    let position = Position::new(function.location.start_line, 1);
    let mut names: Vec<&str> = signature
        .iter()
        .map(|(name, _)| name.short_name())
        .filter(|short| !function.docstring_documents_exception(short))
        .collect();
    names.sort_unstable();
    names.dedup();
    names
        .into_iter()
        .map(|exception| {
            Diagnostic::new(
                DiagnosticCode::RaiseAttention,
                path.to_path_buf(),
                position,
                DiagnosticKind::UndocumentedException {
                    function: function.qualname.as_str().to_string(),
                    exception: exception.to_string(),
                },
            )
        })
        .collect()
}

fn display_name(name: &QualName, full_module_path: bool) -> String {
    if full_module_path {
        name.as_str().to_string()
    } else {
        name.short_name().to_string()
    }
}

/// Slices `lines` (0-indexed) by the 1-indexed `[start_line, end_line]`
/// range a call expression spans, clamped to the file's actual length (a
/// mismatch would only arise from a locator bug, not from any input this
/// function needs to reject).
fn line_slice<'a>(lines: &[&'a str], start_line: u32, end_line: u32) -> Vec<&'a str> {
    let start = start_line.saturating_sub(1) as usize;
    let end = (end_line as usize).min(lines.len());
    if start >= end {
        return Vec::new();
    }
    lines[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pep440_rs::Version;
    use raiseattention_model::ModuleKind;
    use raiseattention_resolver::ExternalResolver;
    use raiseattention_signatures::EngineOptions;
    use raiseattention_stubs::StubStore;
    use std::path::Path;
    use std::str::FromStr;

    fn stubs() -> StubStore {
        StubStore::with_embedded_defaults(&Version::from_str("3.11").unwrap()).expect("loads")
    }

    fn diagnose(src: &str, options: DiagnosticOptions) -> Vec<Diagnostic> {
        let module = raiseattention_visitor::visit_source(
            Path::new("root.py"),
            QualName::new("root"),
            ModuleKind::Project,
            src,
        )
        .expect("valid module");
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let engine = SignatureEngine::new(&resolver, &stub_store, EngineOptions::default());
        engine.analyze(QualName::new("root"), std::sync::Arc::new(module.clone()));
        diagnose_module(&module, &QualName::new("root"), src, &engine, options)
    }

    /// S1: an unhandled call surfaces exactly one diagnostic.
    #[test]
    fn s1_unhandled_call_emits_one_diagnostic() {
        let diagnostics = diagnose(
            indoc! {"
                def r():
                    raise ValueError(\"x\")

                def c():
                    r()
            "},
            DiagnosticOptions::default(),
        );
        assert_eq!(diagnostics.len(), 1);
        let DiagnosticKind::UnhandledException { exceptions, .. } = &diagnostics[0].kind else {
            panic!("expected unhandled-exception diagnostic")
        };
        assert_eq!(exceptions, &["ValueError".to_string()]);
    }

    /// S2: a matching handler silences the diagnostic entirely.
    #[test]
    fn s2_handled_call_emits_nothing() {
        let diagnostics = diagnose(
            indoc! {"
                def r():
                    raise ValueError(\"x\")

                def c():
                    try:
                        r()
                    except ValueError:
                        pass
            "},
            DiagnosticOptions::default(),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn inline_ignore_suppresses_named_exception() {
        let diagnostics = diagnose(
            indoc! {"
                def r():
                    raise ValueError(\"x\")

                def c():
                    r()  # ra: ignore[ValueError]
            "},
            DiagnosticOptions::default(),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn inline_ignore_idempotence_removing_comment_restores_diagnostic() {
        let with_ignore = diagnose(
            "def r():\n    raise ValueError()\ndef c():\n    r()  # ra: ignore[ValueError]\n",
            DiagnosticOptions::default(),
        );
        let without_ignore = diagnose(
            "def r():\n    raise ValueError()\ndef c():\n    r()\n",
            DiagnosticOptions::default(),
        );
        assert!(with_ignore.is_empty());
        assert_eq!(without_ignore.len(), 1);
    }

    #[test]
    fn bare_ignore_comment_warns_and_does_not_suppress() {
        let diagnostics = diagnose(
            "def r():\n    raise ValueError()\ndef c():\n    r()  # ra: ignore\n",
            DiagnosticOptions::default(),
        );
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::InvalidIgnoreComment)));
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::UnhandledException { .. })));
    }

    #[test]
    fn docstring_suppression_removes_documented_exception() {
        let diagnostics = diagnose(
            indoc! {r#"
                def r():
                    raise ValueError("x")

                def c():
                    """Calls r, which Raises a ValueError on bad input."""
                    r()
            "#},
            DiagnosticOptions::default(),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn strict_mode_flags_undocumented_exception() {
        let diagnostics = diagnose(
            indoc! {"
                def r():
                    raise ValueError(\"x\")
            "},
            DiagnosticOptions {
                strict_mode: true,
                ..DiagnosticOptions::default()
            },
        );
        assert!(diagnostics
            .iter()
            .any(|d| matches!(&d.kind, DiagnosticKind::UndocumentedException { exception, .. } if exception == "ValueError")));
    }

    #[test]
    fn builtin_filter_suppresses_uninteresting_exception_only() {
        let diagnostics = diagnose(
            indoc! {r#"
                def c():
                    int("x")
            "#},
            DiagnosticOptions::default(),
        );
        // `int(...)`'s stubbed signature is purely ValueError/TypeError; with
        // TypeError filtered as uninteresting, ValueError should still surface.
        assert!(diagnostics
            .iter()
            .any(|d| matches!(&d.kind, DiagnosticKind::UnhandledException { exceptions, .. } if exceptions.iter().any(|e| e == "ValueError"))));
    }

    #[test]
    fn builtin_filter_ignore_include_suppresses_named_exception() {
        let diagnostics = diagnose(
            indoc! {r#"
                def c():
                    int("x")
            "#},
            DiagnosticOptions {
                ignore_include: vec!["ValueError".to_string()],
                ..DiagnosticOptions::default()
            },
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn diagnostics_sorted_ascending_by_position() {
        let diagnostics = diagnose(
            indoc! {"
                def r():
                    raise ValueError()

                def c():
                    r()
                    r()
            "},
            DiagnosticOptions::default(),
        );
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].position.line < diagnostics[1].position.line);
    }
}
