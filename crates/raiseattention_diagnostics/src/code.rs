/// The stable diagnostic codes a frontend can group/filter on, the way an
/// editor groups rule codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DiagnosticCode {
    /// A call site's signature was not fully covered by enclosing handlers,
    /// inline-ignore, or docstring suppression.
    UnhandledException,
    /// A user-code syntax error, a resolver I/O error, or a fatal engine
    /// invariant violation degraded to a diagnostic rather than aborting
    /// the run.
    InternalError,
    /// The catch-all code for everything that is neither of the above: an
    /// invalid bare `ignore` comment, and, in strict mode, an
    /// undocumented-exception diagnostic.
    RaiseAttention,
}

impl DiagnosticCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::UnhandledException => "unhandled-exception",
            DiagnosticCode::InternalError => "internal-error",
            DiagnosticCode::RaiseAttention => "raiseattention",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
