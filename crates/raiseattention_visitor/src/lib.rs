//! The Syntax Visitor: turns one source file into a [`Module`] of
//! [`FunctionInfo`] records, by walking the parse tree produced by
//! `ruff_python_parser`.
//!
//! Everything in this crate is purely syntactic -- it never looks at other
//! files, never resolves an import to another module's functions, and never
//! decides what a call's *effects* are. That is the External Resolver's and
//! Signature Engine's job (`raiseattention_resolver`, `raiseattention_signatures`).

mod builder;
mod docstring;
mod dotted;
mod imports;
mod locator;
mod walker;

use std::path::Path;

use raiseattention_model::{Module, ModuleKind};

pub use dotted::{expr_to_dotted, is_lambda};

/// A source file failed to parse. A syntax error in a single file degrades
/// that file's contribution to the analysis (its functions fall back to the
/// conservative default) without aborting the whole run.
#[derive(Debug, thiserror::Error)]
#[error("failed to parse {path}: {source}")]
pub struct VisitError {
    pub path: std::path::PathBuf,
    #[source]
    pub source: ruff_python_parser::ParseError,
}

/// Parses `source` (the contents of the file at `path`) and walks it into a
/// [`Module`] of the given `import_path`/`kind`.
pub fn visit_source(
    path: &Path,
    import_path: raiseattention_model::QualName,
    kind: ModuleKind,
    source: &str,
) -> Result<Module, VisitError> {
    let parsed = ruff_python_parser::parse_module(source).map_err(|err| VisitError {
        path: path.to_path_buf(),
        source: err,
    })?;
    let body = &parsed.syntax().body;

    let walker = walker::Walker::new(path, source);
    let (functions, imports, dependencies, reexports) = walker.run(body);

    let mut module = Module::new(import_path, kind);
    module.source_path = Some(path.to_path_buf());
    module.functions = functions;
    module.imports = imports;
    module.dependencies = dependencies;
    module.reexports = reexports;

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use raiseattention_model::QualName;

    fn visit(src: &str) -> Module {
        visit_source(
            Path::new("m.py"),
            QualName::new("m"),
            ModuleKind::Project,
            src,
        )
        .expect("valid module")
    }

    #[test]
    fn module_pseudo_function_always_present() {
        let module = visit("x = 1\n");
        assert!(module.find_function(&QualName::new("<module>")).is_some());
    }

    #[test]
    fn top_level_function_gets_bare_qualname() {
        let module = visit(indoc! {"
            def f():
                pass
        "});
        assert!(module.find_function(&QualName::new("f")).is_some());
    }

    #[test]
    fn method_qualname_includes_class_and_flags_is_method() {
        let module = visit(indoc! {"
            class Widget:
                def render(self):
                    pass
        "});
        let f = module
            .find_function(&QualName::new("Widget.render"))
            .expect("method present");
        assert!(f.flags.is_method);
    }

    #[test]
    fn direct_raise_recorded_with_dotted_name() {
        let module = visit(indoc! {"
            def f():
                raise ValueError(\"bad\")
        "});
        let f = module.find_function(&QualName::new("f")).unwrap();
        assert_eq!(f.direct_raises.len(), 1);
        assert_eq!(f.direct_raises[0].0.as_str(), "ValueError");
    }

    #[test]
    fn bare_reraise_contributes_handlers_caught_class_not_a_literal() {
        let module = visit(indoc! {"
            def f():
                try:
                    g()
                except ValueError:
                    raise
        "});
        let f = module.find_function(&QualName::new("f")).unwrap();
        assert_eq!(f.direct_raises.len(), 1);
        assert_eq!(f.direct_raises[0].0.as_str(), "ValueError");
        assert!(f.flags.has_bare_raise);
    }

    #[test]
    fn reraise_of_bound_handler_variable_contributes_caught_class() {
        let module = visit(indoc! {"
            def f():
                try:
                    g()
                except ValueError as e:
                    raise e
        "});
        let f = module.find_function(&QualName::new("f")).unwrap();
        assert_eq!(f.direct_raises.len(), 1);
        assert_eq!(f.direct_raises[0].0.as_str(), "ValueError");
    }

    #[test]
    fn tuple_handler_reraise_approximates_to_untyped_exception() {
        let module = visit(indoc! {"
            def f():
                try:
                    g()
                except (ValueError, KeyError) as e:
                    raise e
        "});
        let f = module.find_function(&QualName::new("f")).unwrap();
        assert_eq!(f.direct_raises.len(), 1);
        assert_eq!(
            f.direct_raises[0].0.as_str(),
            raiseattention_model::EXCEPTION_UNTYPED
        );
    }

    #[test]
    fn call_records_enclosing_try_scope() {
        let module = visit(indoc! {"
            def f():
                try:
                    g()
                except ValueError:
                    pass
        "});
        let f = module.find_function(&QualName::new("f")).unwrap();
        assert_eq!(f.calls.len(), 1);
        assert_eq!(f.calls[0].enclosing_try_scopes.len(), 1);
    }

    #[test]
    fn call_outside_handler_body_is_not_enclosed_by_its_own_try() {
        let module = visit(indoc! {"
            def f():
                try:
                    pass
                except ValueError:
                    g()
        "});
        let f = module.find_function(&QualName::new("f")).unwrap();
        assert_eq!(f.calls.len(), 1);
        assert!(f.calls[0].enclosing_try_scopes.is_empty());
    }

    #[test]
    fn callable_hint_captured_for_known_first_positional_hof() {
        let module = visit(indoc! {"
            def f():
                sorted(items, key=risky)
        "});
        let f = module.find_function(&QualName::new("f")).unwrap();
        assert_eq!(f.calls[0].callable_hints.len(), 1);
        assert_eq!(f.calls[0].callable_hints[0].0, Some("key"));
    }

    #[test]
    fn nested_function_qualname_is_dotted_through_enclosing_function() {
        let module = visit(indoc! {"
            def outer():
                def inner():
                    pass
        "});
        assert!(module.find_function(&QualName::new("outer.inner")).is_some());
        assert!(module.find_function(&QualName::new("outer")).is_some());
    }

    #[test]
    fn module_level_alias_of_dotted_name_recorded_as_reexport() {
        let module = visit(indoc! {"
            import other_module
            helper = other_module.helper
        "});
        assert_eq!(
            module.reexports.get("helper").map(QualName::as_str),
            Some("other_module.helper")
        );
    }

    #[test]
    fn bare_name_alias_is_not_a_reexport() {
        let module = visit(indoc! {"
            def helper():
                pass
            alias = helper
        "});
        assert!(module.reexports.get("alias").is_none());
    }

    #[test]
    fn parse_error_is_reported_not_panicked() {
        let result = visit_source(
            Path::new("broken.py"),
            QualName::new("broken"),
            ModuleKind::Project,
            "def f(:\n",
        );
        assert!(result.is_err());
    }
}
