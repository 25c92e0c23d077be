use std::fmt;
use std::path::PathBuf;

use raiseattention_model::Position;

use crate::code::DiagnosticCode;

/// The structured payload of one [`Diagnostic`], distinguished by which rule
/// produced it.
#[derive(Debug, Clone)]
pub enum DiagnosticKind {
    /// `unhandled(c)` was nonempty after inline-ignore and docstring
    /// suppression.
    UnhandledException {
        callee: String,
        exceptions: Vec<String>,
    },
    /// A syntax error, resolver I/O error, or fatal engine invariant
    /// violation against a specific file/function.
    InternalError { detail: String },
    /// A bare `ignore` comment with no bracketed list is invalid and does
    /// not suppress anything.
    InvalidIgnoreComment,
    /// `--strict`: a function's may-raise set contains a class whose short
    /// name its docstring never mentions.
    UndocumentedException { function: String, exception: String },
}

/// One emitted diagnostic. Frontends (CLI, LSP) render this however fits
/// their transport; [`Diagnostic`]'s own [`fmt::Display`] produces the
/// CLI's human-readable line.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub path: PathBuf,
    pub position: Position,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    #[must_use]
    pub fn new(code: DiagnosticCode, path: PathBuf, position: Position, kind: DiagnosticKind) -> Self {
        Self {
            code,
            path,
            position,
            kind,
        }
    }

    /// The message body, without the `<path>:<line>:<col>: ` prefix used by
    /// the human CLI format -- used standalone by the LSP frontend, which
    /// conveys location through the protocol's own `Range` instead.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::UnhandledException { callee, exceptions } => {
                format!(
                    "call to '{callee}' may raise unhandled exception(s): {}",
                    exceptions.join(", ")
                )
            }
            DiagnosticKind::InternalError { detail } => format!("internal error: {detail}"),
            DiagnosticKind::InvalidIgnoreComment => {
                "'ignore' directive has no bracketed exception list and suppresses nothing".to_string()
            }
            DiagnosticKind::UndocumentedException { function, exception } => {
                format!("function '{function}' may raise undocumented exception '{exception}'")
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: error: {}",
            self.path.display(),
            self.position.line,
            self.position.column,
            self.message()
        )
    }
}
