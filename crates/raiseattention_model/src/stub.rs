use crate::ExceptionSet;

/// The result of a Stub Store lookup.
#[derive(Debug, Clone)]
pub struct StubRecord {
    pub exceptions: ExceptionSet,
    /// Free-text description of where this stub came from, e.g. the stub
    /// database file name and the matched `module.class.method` path.
    /// Surfaced in `--debug` logging, never in diagnostics.
    pub provenance: String,
    /// `true` when the match came from scanning every class in the module
    /// for a matching method name, rather than an exact
    /// `(module, class, method)` hit.
    pub fuzzy_match: bool,
}

impl StubRecord {
    #[must_use]
    pub fn new(exceptions: ExceptionSet, provenance: impl Into<String>, fuzzy_match: bool) -> Self {
        Self {
            exceptions,
            provenance: provenance.into(),
            fuzzy_match,
        }
    }
}
