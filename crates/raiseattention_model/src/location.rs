use std::path::{Path, PathBuf};

/// A one-indexed line/column pair, matching how editors and the CLI's
/// human-readable output report positions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A location within a source file: the path plus a start/end line range.
///
/// Kept path-owning rather than borrowed so [`FunctionInfo`](crate::FunctionInfo)
/// and friends can outlive the parsed tree they were extracted from (the
/// cache layer persists them across process runs).
#[derive(Debug, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
}

impl Location {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, start_line: u32, end_line: u32) -> Self {
        Self {
            path: path.into(),
            start_line,
            end_line,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `line` falls within this location's `[start_line, end_line]`
    /// range, inclusive. Used to validate invariant 2 in the data model: a
    /// call's enclosing try-scopes must contain the call's line.
    #[must_use]
    pub fn contains_line(&self, line: u32) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}
