//! The fixed built-in exception hierarchy: which classes are ancestors of
//! which. Shared between the Signature Engine (subtracting `handled_at(c)`
//! from a propagated signature) and the Diagnostic Engine (expanding a
//! handler's caught set by descendants) so the two components can never
//! disagree about what "catching `OSError` handles `FileNotFoundError`"
//! means.
//!
//! Encoded as a flat child -> parent table rather than a tree of owned
//! nodes: membership and ancestor-walks only ever need "what is this
//! class's parent", never "what are this class's children".

/// `(class, immediate parent)` pairs. Anything not listed here is assumed
/// to derive directly from `Exception` (the common case for project-defined
/// or unrecognised exception names) unless it *is* `Exception` or
/// `BaseException` themselves, which have no listed parent.
const PARENT_OF: &[(&str, &str)] = &[
    ("SystemExit", "BaseException"),
    ("KeyboardInterrupt", "BaseException"),
    ("GeneratorExit", "BaseException"),
    ("Exception", "BaseException"),
    ("StopIteration", "Exception"),
    ("StopAsyncIteration", "Exception"),
    ("ArithmeticError", "Exception"),
    ("FloatingPointError", "ArithmeticError"),
    ("OverflowError", "ArithmeticError"),
    ("ZeroDivisionError", "ArithmeticError"),
    ("AssertionError", "Exception"),
    ("AttributeError", "Exception"),
    ("BufferError", "Exception"),
    ("EOFError", "Exception"),
    ("ImportError", "Exception"),
    ("ModuleNotFoundError", "ImportError"),
    ("LookupError", "Exception"),
    ("IndexError", "LookupError"),
    ("KeyError", "LookupError"),
    ("MemoryError", "Exception"),
    ("NameError", "Exception"),
    ("UnboundLocalError", "NameError"),
    ("OSError", "Exception"),
    ("BlockingIOError", "OSError"),
    ("ChildProcessError", "OSError"),
    ("ConnectionError", "OSError"),
    ("BrokenPipeError", "ConnectionError"),
    ("ConnectionAbortedError", "ConnectionError"),
    ("ConnectionRefusedError", "ConnectionError"),
    ("ConnectionResetError", "ConnectionError"),
    ("FileExistsError", "OSError"),
    ("FileNotFoundError", "OSError"),
    ("InterruptedError", "OSError"),
    ("IsADirectoryError", "OSError"),
    ("NotADirectoryError", "OSError"),
    ("PermissionError", "OSError"),
    ("ProcessLookupError", "OSError"),
    ("TimeoutError", "OSError"),
    ("ReferenceError", "Exception"),
    ("RuntimeError", "Exception"),
    ("NotImplementedError", "RuntimeError"),
    ("RecursionError", "RuntimeError"),
    ("SyntaxError", "Exception"),
    ("IndentationError", "SyntaxError"),
    ("TabError", "IndentationError"),
    ("SystemError", "Exception"),
    ("TypeError", "Exception"),
    ("ValueError", "Exception"),
    ("UnicodeError", "ValueError"),
    ("UnicodeDecodeError", "UnicodeError"),
    ("UnicodeEncodeError", "UnicodeError"),
    ("UnicodeTranslateError", "UnicodeError"),
    ("Warning", "Exception"),
    ("DeprecationWarning", "Warning"),
    ("PendingDeprecationWarning", "Warning"),
    ("RuntimeWarning", "Warning"),
    ("SyntaxWarning", "Warning"),
    ("UserWarning", "Warning"),
    ("FutureWarning", "Warning"),
    ("ImportWarning", "Warning"),
    ("UnicodeWarning", "Warning"),
    ("BytesWarning", "Warning"),
    ("ResourceWarning", "Warning"),
    // JSONDecodeError subclasses ValueError in the standard library.
    ("JSONDecodeError", "ValueError"),
];

/// The immediate parent of `short_name` in the built-in hierarchy, or
/// `None` if it has no known parent (`BaseException`, or any name this
/// table doesn't recognise at all -- an unrecognised name is assumed to be
/// a project-defined exception and is *not* silently rooted at `Exception`
/// here; see [`is_ancestor_or_self`] for how that assumption is applied).
#[must_use]
pub fn parent_of(short_name: &str) -> Option<&'static str> {
    PARENT_OF
        .iter()
        .find(|(name, _)| *name == short_name)
        .map(|(_, parent)| *parent)
}

/// Returns `true` if `short_name` is recognised anywhere in the built-in
/// hierarchy table (as a child or as `BaseException`/`Exception`
/// themselves).
#[must_use]
pub fn is_known_builtin(short_name: &str) -> bool {
    short_name == "BaseException"
        || short_name == "Exception"
        || PARENT_OF.iter().any(|(name, _)| *name == short_name)
}

/// Returns `true` if `ancestor` is `descendant` itself, or a strict
/// ancestor of it in the built-in hierarchy: catching `X` handles all `Y`
/// where `Y` is `X` or a descendant of it in the fixed built-in hierarchy
/// table.
///
/// An `ancestor` that is not itself a recognised built-in name (a
/// project-defined exception class) only matches by exact equality: this
/// function never invents hierarchy relationships for names outside the
/// fixed table.
#[must_use]
pub fn is_ancestor_or_self(ancestor: &str, descendant: &str) -> bool {
    if ancestor == descendant {
        return true;
    }
    if !is_known_builtin(ancestor) {
        return false;
    }
    let mut current = descendant;
    while let Some(parent) = parent_of(current) {
        if parent == ancestor {
            return true;
        }
        current = parent;
    }
    false
}
