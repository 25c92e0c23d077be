use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use raiseattention_model::QualName;

/// Walks `path` (or, if it's already a file, yields just that file) for
/// `.py` source files, honouring `.gitignore`/`.ignore` along the way; the
/// `exclude` config key is applied separately by the caller via
/// [`raiseattention_config::Config::is_excluded`].
#[must_use]
pub fn discover_python_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files = Vec::new();
    for entry in WalkBuilder::new(path).hidden(false).build() {
        let Ok(entry) = entry else { continue };
        if entry.file_type().is_some_and(|ft| ft.is_file())
            && entry.path().extension().is_some_and(|ext| ext == "py")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    files
}

/// Turns each CLI-given path into an analysis root: a directory argument is
/// its own root; a file argument's root is its parent directory (so a
/// lone script's sibling imports still resolve), falling back to the
/// current directory if the file has none.
#[must_use]
pub fn derive_roots(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for path in paths {
        let root = if path.is_dir() {
            path.clone()
        } else {
            path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
        };
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

/// Derives the dotted import path a discovered file should be registered
/// under: relative to whichever configured root is its most specific
/// (deepest) ancestor, with the `.py` extension stripped and `__init__`
/// collapsed into its package's own name. A file under none of the given
/// roots (e.g. a single script analysed on its own) falls back to its own
/// stem.
#[must_use]
pub fn qualname_for(path: &Path, roots: &[PathBuf]) -> QualName {
    let best_root = roots
        .iter()
        .filter(|root| path.starts_with(root))
        .max_by_key(|root| root.components().count());

    let Some(root) = best_root else {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        return QualName::new(stem);
    };

    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if let Some(last) = segments.last_mut() {
        *last = last.trim_end_matches(".py").to_string();
    }
    if segments.last().map(String::as_str) == Some("__init__") {
        segments.pop();
    }

    QualName::new(segments.join("."))
}
