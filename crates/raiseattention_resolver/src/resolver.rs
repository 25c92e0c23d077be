use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use sha2::{Digest, Sha256};

use raiseattention_model::{Module, ModuleKind, QualName};

use crate::error::ResolverError;
use crate::venv::VenvInfo;

/// Outcome of asking the resolver for a dotted module path.
pub enum Resolution {
    /// TL source was found and parsed (or returned from the per-path
    /// memoisation cache unchanged).
    Source(Arc<Module>),
    /// No source exists for this name -- either nothing was found at all,
    /// or a compiled/native extension occupies the name. Both are treated
    /// the same way: native-opaque.
    Native,
    /// The module is already being resolved further up the call stack, so
    /// it must not recurse into the cycle. The caller -- the Signature
    /// Engine's worklist fixpoint -- is responsible for revisiting it once
    /// the cycle's other members have a signature.
    Pending,
}

/// Locates and parses modules on demand.
///
/// Holds no opinion about exception signatures -- it only turns a dotted
/// import path into a parsed [`Module`], or classifies it as native. The
/// Signature Engine owns the recursive fixpoint that turns a `Module` into
/// per-function `ExceptionSet`s, and consults the Stub Store itself for
/// whatever this resolver reports as [`Resolution::Native`].
pub struct ExternalResolver {
    project_roots: Vec<PathBuf>,
    stdlib_root: Option<PathBuf>,
    venv: Option<VenvInfo>,
    cache: RefCell<FxHashMap<PathBuf, (String, Arc<Module>)>>,
    active: RefCell<FxHashSet<PathBuf>>,
}

impl ExternalResolver {
    #[must_use]
    pub fn new(
        project_roots: Vec<PathBuf>,
        stdlib_root: Option<PathBuf>,
        venv: Option<VenvInfo>,
    ) -> Self {
        Self {
            project_roots,
            stdlib_root,
            venv,
            cache: RefCell::new(FxHashMap::default()),
            active: RefCell::new(FxHashSet::default()),
        }
    }

    /// Locates the source file backing `dotted`, without parsing it.
    /// `importing_dir` is the directory of the module that issued the
    /// import, required to resolve a relative (leading-dot) name; an
    /// absolute/top-level name ignores it.
    #[must_use]
    pub fn locate(
        &self,
        dotted: &QualName,
        importing_dir: Option<&Path>,
    ) -> Option<(PathBuf, ModuleKind)> {
        let (dots, segments) = split_relative(dotted.as_str());
        if dots > 0 {
            let mut dir = importing_dir?.to_path_buf();
            for _ in 1..dots {
                dir = dir.parent()?.to_path_buf();
            }
            return locate_under(&dir, &segments, ModuleKind::Project);
        }
        for root in &self.project_roots {
            if let Some(found) = locate_under(root, &segments, ModuleKind::Project) {
                return Some(found);
            }
        }
        if let Some(stdlib) = &self.stdlib_root {
            if let Some(found) = locate_under(stdlib, &segments, ModuleKind::StdlibSource) {
                return Some(found);
            }
        }
        if let Some(venv) = &self.venv {
            if let Some(found) =
                locate_under(&venv.site_packages, &segments, ModuleKind::SitePackagesSource)
            {
                return Some(found);
            }
        }
        None
    }

    /// Resolves `dotted` to a parsed module, a native classification, or a
    /// cycle-pending placeholder.
    pub fn resolve(
        &self,
        dotted: &QualName,
        importing_dir: Option<&Path>,
    ) -> Result<Resolution, ResolverError> {
        let Some((path, kind)) = self.locate(dotted, importing_dir) else {
            return Ok(Resolution::Native);
        };
        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());

        if self.active.borrow().contains(&canonical) {
            return Ok(Resolution::Pending);
        }

        let contents = std::fs::read_to_string(&canonical).map_err(|source| ResolverError::Io {
            path: canonical.clone(),
            source,
        })?;
        let hash = content_hash(&contents);

        if let Some((cached_hash, module)) = self.cache.borrow().get(&canonical) {
            if *cached_hash == hash {
                return Ok(Resolution::Source(Arc::clone(module)));
            }
        }

        self.active.borrow_mut().insert(canonical.clone());
        let visited = raiseattention_visitor::visit_source(&canonical, dotted.clone(), kind, &contents);
        self.active.borrow_mut().remove(&canonical);

        let module = Arc::new(visited?);
        self.cache
            .borrow_mut()
            .insert(canonical, (hash, Arc::clone(&module)));
        Ok(Resolution::Source(module))
    }

    /// Number of distinct modules currently memoised. Surfaced for
    /// `--debug` logging.
    #[must_use]
    pub fn cached_module_count(&self) -> usize {
        self.cache.borrow().len()
    }
}

/// Follows one level of re-export: if `module` binds `name` as a top-level
/// alias of another dotted name, return that name instead of `name` itself.
#[must_use]
pub fn follow_reexport(module: &Module, name: &str) -> Option<QualName> {
    module.reexports.get(name).cloned()
}

fn split_relative(raw: &str) -> (usize, Vec<&str>) {
    let dots = raw.chars().take_while(|&c| c == '.').count();
    let rest = &raw[dots..];
    let segments = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split('.').collect()
    };
    (dots, segments)
}

fn locate_under(
    root: &Path,
    segments: &[&str],
    kind: ModuleKind,
) -> Option<(PathBuf, ModuleKind)> {
    if segments.is_empty() {
        return None;
    }
    let mut base = root.to_path_buf();
    for segment in segments {
        base.push(segment);
    }
    let as_module = base.with_extension("py");
    if as_module.is_file() {
        return Some((as_module, kind));
    }
    let as_package = base.join("__init__.py");
    if as_package.is_file() {
        return Some((as_package, kind));
    }
    None
}

fn content_hash(contents: &str) -> String {
    let digest = Sha256::digest(contents.as_bytes());
    format!("{digest:x}")
}
