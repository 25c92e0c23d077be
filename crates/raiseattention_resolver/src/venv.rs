use std::path::{Path, PathBuf};

/// Detected virtual-environment metadata. Cached for the lifetime of an
/// `AnalysisSession` by the caller -- this function itself is a pure
/// filesystem probe and does no caching of its own.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VenvInfo {
    pub root: PathBuf,
    pub site_packages: PathBuf,
    /// The `version` line recorded in `pyvenv.cfg`, if present.
    pub python_version: Option<String>,
}

/// Searches upward from `start` (and the well-known `VIRTUAL_ENV`
/// environment variable) for a `pyvenv.cfg` marker, the standard venv
/// layout. Poetry/Pipenv projects are not probed further than their own
/// `pyvenv.cfg` -- those tools create a standard venv under the hood, so
/// the same marker search finds them; a project with no detectable venv at
/// all degrades to no site-packages lookup.
#[must_use]
pub fn detect_venv(start: &Path) -> Option<VenvInfo> {
    if let Ok(env_path) = std::env::var("VIRTUAL_ENV") {
        if let Some(info) = venv_info_from_root(Path::new(&env_path)) {
            return Some(info);
        }
    }
    for ancestor in start.ancestors() {
        for candidate in [".venv", "venv"] {
            let root = ancestor.join(candidate);
            if root.join("pyvenv.cfg").is_file() {
                if let Some(info) = venv_info_from_root(&root) {
                    return Some(info);
                }
            }
        }
    }
    None
}

fn venv_info_from_root(root: &Path) -> Option<VenvInfo> {
    let cfg_path = root.join("pyvenv.cfg");
    let python_version = std::fs::read_to_string(&cfg_path).ok().and_then(|contents| {
        contents.lines().find_map(|line| {
            let (key, value) = line.split_once('=')?;
            (key.trim() == "version").then(|| value.trim().to_owned())
        })
    });
    let site_packages = locate_site_packages(root)?;
    Some(VenvInfo {
        root: root.to_path_buf(),
        site_packages,
        python_version,
    })
}

/// POSIX venvs put site-packages at `<root>/lib/python3.X/site-packages`;
/// Windows venvs use `<root>/Lib/site-packages`.
fn locate_site_packages(root: &Path) -> Option<PathBuf> {
    if let Ok(entries) = std::fs::read_dir(root.join("lib")) {
        for entry in entries.flatten() {
            let candidate = entry.path().join("site-packages");
            if candidate.is_dir() {
                return Some(candidate);
            }
        }
    }
    let windows_candidate = root.join("Lib").join("site-packages");
    if windows_candidate.is_dir() {
        return Some(windows_candidate);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detects_posix_layout_venv() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let venv_root = tmp.path().join(".venv");
        fs::create_dir_all(venv_root.join("lib/python3.12/site-packages")).unwrap();
        fs::write(venv_root.join("pyvenv.cfg"), "version = 3.12.1\n").unwrap();

        let project = venv_root.join("src"); // a nested "project" directory to search upward from
        fs::create_dir_all(&project).unwrap();

        let info = detect_venv(&project).expect("venv detected");
        assert_eq!(info.python_version.as_deref(), Some("3.12.1"));
        assert!(info.site_packages.ends_with("site-packages"));
    }

    #[test]
    fn no_venv_found_returns_none() {
        let tmp = tempfile::tempdir().expect("tempdir");
        assert!(detect_venv(tmp.path()).is_none());
    }
}
