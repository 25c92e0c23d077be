use crate::QualName;

/// Identifies a [`TryScope`] within a single function. Indexes into
/// `FunctionInfo::try_scopes`; stable for the lifetime of one parse.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct TryScopeId(pub u32);

/// One `except` clause of a [`TryScope`].
#[derive(Debug, Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExceptHandler {
    /// The caught exception class names. Empty with `is_universal = true`
    /// denotes a bare `except:`, equivalent to catching `BaseException`.
    pub caught: Vec<QualName>,
    pub is_universal: bool,
    /// The `as name` binding, if any, e.g. `e` in `except ValueError as e:`.
    /// Used for re-raise detection.
    pub as_name: Option<String>,
}

impl ExceptHandler {
    #[must_use]
    pub fn universal() -> Self {
        Self {
            caught: Vec::new(),
            is_universal: true,
            as_name: None,
        }
    }

    #[must_use]
    pub fn typed(caught: Vec<QualName>, as_name: Option<String>) -> Self {
        Self {
            caught,
            is_universal: false,
            as_name,
        }
    }
}

/// One `try` block within a function.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TryScope {
    pub id: TryScopeId,
    /// Line range `[start, end]` covering the guarded region (the `try:`
    /// suite, not the handlers themselves -- a call inside an `except`
    /// block is not "inside" that same try's guarded region).
    pub start_line: u32,
    pub end_line: u32,
    /// Handlers in source order.
    pub handlers: Vec<ExceptHandler>,
}

impl TryScope {
    #[must_use]
    pub fn new(id: TryScopeId, start_line: u32, end_line: u32) -> Self {
        Self {
            id,
            start_line,
            end_line,
            handlers: Vec::new(),
        }
    }

    #[must_use]
    pub fn contains_line(&self, line: u32) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}
