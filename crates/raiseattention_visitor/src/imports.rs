use ruff_python_ast::{Alias, Stmt, StmtImport, StmtImportFrom};
use rustc_hash::FxHashSet;

use raiseattention_model::{ImportTable, QualName};

/// Record the bindings introduced by an `import`/`from ... import ...`
/// statement into `imports`, and the modules it depends on into `deps`.
///
/// Relative imports (`from . import foo`, `from .pkg import bar`) are
/// encoded with their leading-dot count preserved as literal leading dots
/// in the bound path (e.g. `.pkg.bar`); the External Resolver is
/// responsible for turning that into an actual filesystem walk relative to
/// the importing module's package.
pub fn record_import(stmt: &Stmt, imports: &mut ImportTable, deps: &mut FxHashSet<QualName>) {
    match stmt {
        Stmt::Import(StmtImport { names, .. }) => {
            for alias in names {
                record_plain_import(alias, imports, deps);
            }
        }
        Stmt::ImportFrom(StmtImportFrom {
            module,
            names,
            level,
            ..
        }) => {
            let base = relative_prefix(*level) + module.as_ref().map(|m| m.as_str()).unwrap_or("");
            if !base.is_empty() {
                deps.insert(QualName::new(base.clone()));
            }
            for alias in names {
                record_from_import(&base, alias, imports, deps);
            }
        }
        _ => {}
    }
}

fn relative_prefix(level: u32) -> String {
    ".".repeat(level as usize)
}

fn record_plain_import(alias: &Alias, imports: &mut ImportTable, deps: &mut FxHashSet<QualName>) {
    let dotted = alias.name.as_str();
    deps.insert(QualName::new(dotted));
    match &alias.asname {
        Some(asname) => {
            imports.insert(asname.to_string(), QualName::new(dotted));
        }
        None => {
            // `import a.b.c` binds only the top-level segment `a` in the
            // local namespace; the rest is reached by attribute access,
            // which `dotted::expr_to_dotted` already reconstructs.
            let top = dotted.split('.').next().unwrap_or(dotted);
            imports.insert(top.to_string(), QualName::new(top));
        }
    }
}

fn record_from_import(
    base: &str,
    alias: &Alias,
    imports: &mut ImportTable,
    deps: &mut FxHashSet<QualName>,
) {
    let member = alias.name.as_str();
    if member == "*" {
        // Star imports make every name in `base` ambiguous; we do not model
        // wildcard rebinding (spec non-goals: no dynamic/first-class lookup
        // of names by string). Record the dependency so the resolver can
        // still parse `base` on demand, but do not bind any local name.
        deps.insert(QualName::new(base));
        return;
    }
    let qualified = if base.is_empty() {
        member.to_string()
    } else {
        format!("{base}.{member}")
    };
    let local = alias.asname.as_ref().map(|n| n.to_string()).unwrap_or_else(|| member.to_string());
    imports.insert(local, QualName::new(qualified));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruff_python_parser::parse_module;

    fn imports_of(src: &str) -> ImportTable {
        let body = parse_module(src).expect("valid module").into_syntax().body;
        let mut imports = ImportTable::default();
        let mut deps = FxHashSet::default();
        for stmt in &body {
            record_import(stmt, &mut imports, &mut deps);
        }
        imports
    }

    #[test]
    fn plain_import_binds_top_level_segment() {
        let imports = imports_of("import os.path\n");
        assert_eq!(imports.get("os").unwrap().as_str(), "os");
    }

    #[test]
    fn aliased_import_binds_full_path() {
        let imports = imports_of("import os.path as p\n");
        assert_eq!(imports.get("p").unwrap().as_str(), "os.path");
    }

    #[test]
    fn from_import_binds_member() {
        let imports = imports_of("from os import path\n");
        assert_eq!(imports.get("path").unwrap().as_str(), "os.path");
    }

    #[test]
    fn from_import_with_alias() {
        let imports = imports_of("from os import path as p\n");
        assert_eq!(imports.get("p").unwrap().as_str(), "os.path");
    }

    #[test]
    fn relative_import_keeps_leading_dots() {
        let imports = imports_of("from .sibling import helper\n");
        assert_eq!(imports.get("helper").unwrap().as_str(), ".sibling.helper");
    }
}
