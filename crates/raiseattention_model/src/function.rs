use crate::{Location, Position, QualName, TryScopeId};

/// A callable-argument hint attached to a [`CallInfo`].
///
/// Only emitted when the argument expression is syntactically a name or
/// dotted attribute; anything else (a call result, a subscript) is simply
/// absent from `CallInfo::callable_hints`, and a lambda becomes
/// [`CallableHint::Lambda`] rather than being dropped, so the Signature
/// Engine can still tell "there was a callable argument here, but it's
/// opaque" from "there was no callable argument here at all".
#[derive(Debug, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CallableHint {
    /// A resolvable dotted name, e.g. `module.helper` or `self.validate`.
    Named(QualName),
    /// A lambda expression passed directly as the argument.
    Lambda,
}

/// The parameter position or keyword a [`CallableHint`] was attached to,
/// e.g. `key=...` in `sorted(items, key=risky)`. `None` means a bare
/// positional argument matched against the higher-order-function registry's
/// "first positional callable" pattern.
pub type CallableHintSlot = Option<&'static str>;

/// One observed call expression.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CallInfo {
    /// The callee expression as a dotted string, when syntactically
    /// resolvable (a `Name` or chain of `Attribute` accesses). `None` when
    /// the callee is some other expression form (e.g. a call result or
    /// subscript) and must be treated as opaque.
    pub callee: Option<QualName>,
    pub position: Position,
    /// The last physical line this call expression's syntax spans. Equal to
    /// `position.line` for a single-line call; greater for a call whose
    /// arguments wrap across lines. Used by the Diagnostic Engine to find
    /// an inline-ignore comment on the call's physical line or the
    /// trailing line of a multi-line call expression.
    pub end_line: u32,
    /// Enclosing try-scope ids at this call site, innermost last.
    pub enclosing_try_scopes: Vec<TryScopeId>,
    /// Callable-argument hints, alongside the slot (keyword name, or `None`
    /// for "first positional") they were passed at.
    pub callable_hints: Vec<(CallableHintSlot, CallableHint)>,
    /// Whether this call expression appears inside an `await`. Recorded for
    /// completeness; it does not change how the call is analysed (`await`
    /// is transparent).
    pub is_awaited: bool,
}

impl CallInfo {
    #[must_use]
    pub fn new(callee: Option<QualName>, position: Position) -> Self {
        Self {
            callee,
            end_line: position.line,
            position,
            enclosing_try_scopes: Vec::new(),
            callable_hints: Vec::new(),
            is_awaited: false,
        }
    }

    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.callee.is_none()
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionFlags {
    pub is_async: bool,
    pub is_method: bool,
    /// A bare `raise` statement appears somewhere not immediately inside an
    /// `except` handler's own body (a re-raise outside of any handler is a
    /// runtime error at execution time, but the visitor records it rather
    /// than rejecting the file; syntax errors are handled at the parse
    /// stage, not here).
    pub has_bare_raise: bool,
}

/// One discovered function or method.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionInfo {
    pub qualname: QualName,
    pub location: Location,
    pub decorators: Vec<QualName>,
    pub docstring: Option<String>,
    /// Direct raises: exception name -> "this contributes a new exception"
    /// (`true`) or "this is a bare re-raise of a bound handler variable and
    /// contributes nothing new" (`false`). Kept as a vector rather than a
    /// set because source order matters for some diagnostics (not
    /// currently used, but preserved for consistency with `CallInfo`'s own
    /// ordering).
    pub direct_raises: Vec<(QualName, bool)>,
    pub calls: Vec<CallInfo>,
    pub try_scopes: Vec<crate::TryScope>,
    pub flags: FunctionFlags,
}

impl FunctionInfo {
    #[must_use]
    pub fn new(qualname: QualName, location: Location) -> Self {
        Self {
            qualname,
            location,
            decorators: Vec::new(),
            docstring: None,
            direct_raises: Vec::new(),
            calls: Vec::new(),
            try_scopes: Vec::new(),
            flags: FunctionFlags::default(),
        }
    }

    /// Returns `true` if the docstring mentions "raise" or "raises"
    /// case-insensitively -- the fallback rule for an untyped raise, and
    /// the precondition for docstring-based suppression.
    #[must_use]
    pub fn docstring_mentions_raise(&self) -> bool {
        self.docstring
            .as_deref()
            .map(docstring_mentions_raise_token)
            .unwrap_or(false)
    }

    /// Returns `true` if the docstring mentions both "raise"/"raises" and
    /// the given exception's exact short-name token. Substring matches on
    /// unrelated prose don't count -- this requires a word-boundary match,
    /// not `str::contains`.
    #[must_use]
    pub fn docstring_documents_exception(&self, short_name: &str) -> bool {
        let Some(docstring) = self.docstring.as_deref() else {
            return false;
        };
        docstring_mentions_raise_token(docstring) && contains_word(docstring, short_name)
    }
}

fn docstring_mentions_raise_token(docstring: &str) -> bool {
    contains_word_ci(docstring, "raise") || contains_word_ci(docstring, "raises")
}

/// Whether `haystack` contains `needle` as a whole word, case-insensitively.
fn contains_word_ci(haystack: &str, needle: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|word| word.eq_ignore_ascii_case(needle))
}

/// Whether `haystack` contains `needle` as a whole word, matched exactly
/// (case-sensitive): exception class names are case-sensitive identifiers,
/// so `valueerror` in prose should not match `ValueError`.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|word| word == needle)
}
