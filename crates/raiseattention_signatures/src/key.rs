use std::fmt;

use raiseattention_model::QualName;

/// Identifies one function across the whole analysis: its owning module's
/// import path plus its qualname within that module. Two functions with the
/// same name in different modules (e.g. two `main`s) never collide, since
/// the worklist and the reverse-call-graph index are keyed on this pair
/// rather than on the qualname alone.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FunctionKey {
    pub module: QualName,
    pub function: QualName,
}

impl FunctionKey {
    #[must_use]
    pub fn new(module: QualName, function: QualName) -> Self {
        Self { module, function }
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.function)
    }
}
