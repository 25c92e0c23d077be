//! The fixed decorator registry: decorators whose exception behaviour is
//! known to be transparent (they neither add nor hide exceptions, so the
//! decorated function's own signature is already the full story). Anything
//! not in this list is an "unknown wrapper": the Signature Engine only
//! learns something about it if it happens to be defined in reachable
//! source with a non-trivial signature itself, in which case it
//! contributes a conservative `Exception`.

/// Matched against a decorator's short (rightmost) dotted segment, so both
/// `@cache` and `@functools.cache` match the same entry.
const TRANSPARENT_DECORATORS: &[&str] = &[
    "property",
    "staticmethod",
    "classmethod",
    "abstractmethod",
    "cache",
    "lru_cache",
    "cached_property",
    "wraps",
    "contextmanager",
    "asynccontextmanager",
    "overload",
    "final",
    "override",
];

/// Returns `true` if `short_name` is a recognised transparent wrapper.
#[must_use]
pub fn is_transparent(short_name: &str) -> bool {
    TRANSPARENT_DECORATORS.contains(&short_name)
}
