use std::path::PathBuf;

use rustc_hash::FxHashSet;

use crate::{FunctionInfo, QualName};

/// Where a [`Module`]'s source was found.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ModuleKind {
    /// Under one of the analysis roots given on the command line / opened
    /// in the editor.
    Project,
    /// Under the configured TL install's standard library.
    StdlibSource,
    /// Under the detected virtual environment's site-packages, with source
    /// available.
    SitePackagesSource,
    /// No TL source available -- a compiled/native extension module, or an
    /// import that could not be located at all. Exception information for
    /// functions in a native module can only come from the Stub Store.
    Native,
}

impl ModuleKind {
    #[must_use]
    pub fn has_source(self) -> bool {
        !matches!(self, ModuleKind::Native)
    }
}

/// Maps a name bound in a module (by `import`/`from ... import ...`) to the
/// fully dotted path it refers to. Built by the Syntax Visitor, consumed by
/// the External Resolver.
pub type ImportTable = rustc_hash::FxHashMap<String, QualName>;

/// A resolved module: import-path key to everything the resolver and
/// signature engine need about it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Module {
    pub import_path: QualName,
    pub source_path: Option<PathBuf>,
    pub kind: ModuleKind,
    pub functions: Vec<FunctionInfo>,
    pub imports: ImportTable,
    /// Other modules this module imports, by import path. Used to build the
    /// reverse dependency index the cache layer invalidates against, and to
    /// detect resolver cycles.
    pub dependencies: FxHashSet<QualName>,
    /// Top-level `name = other.module.attr` bindings: a one-level re-export
    /// the External Resolver follows transparently rather than treating
    /// `name` as a function defined in this module.
    pub reexports: rustc_hash::FxHashMap<String, QualName>,
}

impl Module {
    #[must_use]
    pub fn new(import_path: QualName, kind: ModuleKind) -> Self {
        Self {
            import_path,
            source_path: None,
            kind,
            functions: Vec::new(),
            imports: ImportTable::default(),
            dependencies: FxHashSet::default(),
            reexports: rustc_hash::FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn find_function(&self, qualname: &QualName) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| &f.qualname == qualname)
    }
}
