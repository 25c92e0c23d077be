use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::partial::PartialConfig;

/// Loads `[tool.raiseattention]` (and, layered on top of it, the more
/// specific `[tool.raiseattention.analysis]`) from `<project_root>/pyproject.toml`.
/// Absence of the file, or of either table, is not an error -- it simply
/// contributes nothing, same as any other silent layer.
pub fn load_pyproject_layer(project_root: &Path) -> Result<PartialConfig, ConfigError> {
    let path = project_root.join("pyproject.toml");
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(PartialConfig::default()),
        Err(source) => return Err(ConfigError::Io { path, source }),
    };

    let document: toml::Value = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
        path: path.clone(),
        source,
    })?;

    let Some(tool_table) = document.get("tool").and_then(|tool| tool.get("raiseattention")) else {
        return Ok(PartialConfig::default());
    };

    let base: PartialConfig = tool_table.clone().try_into().map_err(|source| ConfigError::Toml {
        path: path.clone(),
        source,
    })?;
    let analysis: PartialConfig = tool_table
        .get("analysis")
        .map(|table| table.clone().try_into())
        .transpose()
        .map_err(|source| ConfigError::Toml { path, source })?
        .unwrap_or_default();

    // `[tool.raiseattention.analysis]` is the more specific table, so its
    // keys win over `[tool.raiseattention]`'s own top-level keys.
    Ok(base.overlay(analysis))
}

/// Loads `<project_root>/.raiseattention.toml` in full as one flat
/// [`PartialConfig`] layer. Absence is not an error.
pub fn load_dotfile_layer(project_root: &Path) -> Result<PartialConfig, ConfigError> {
    let path = project_root.join(".raiseattention.toml");
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(PartialConfig::default()),
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    toml::from_str(&contents).map_err(|source| ConfigError::Toml { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::tempdir;

    #[test]
    fn missing_pyproject_toml_yields_empty_layer() {
        let dir = tempdir().unwrap();
        let layer = load_pyproject_layer(dir.path()).unwrap();
        assert_eq!(layer.strict_mode, None);
    }

    #[test]
    fn pyproject_tool_table_is_read() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            indoc! {r#"
                [tool.raiseattention]
                strict_mode = true
                exclude = ["**/tests/**"]
            "#},
        )
        .unwrap();
        let layer = load_pyproject_layer(dir.path()).unwrap();
        assert_eq!(layer.strict_mode, Some(true));
        assert_eq!(layer.exclude, Some(vec!["**/tests/**".to_string()]));
    }

    #[test]
    fn analysis_subtable_overrides_top_level_table() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            indoc! {r#"
                [tool.raiseattention]
                strict_mode = false

                [tool.raiseattention.analysis]
                strict_mode = true
            "#},
        )
        .unwrap();
        let layer = load_pyproject_layer(dir.path()).unwrap();
        assert_eq!(layer.strict_mode, Some(true));
    }

    #[test]
    fn dotfile_layer_is_read() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".raiseattention.toml"), "local_only = true\n").unwrap();
        let layer = load_dotfile_layer(dir.path()).unwrap();
        assert_eq!(layer.local_only, Some(true));
    }
}
