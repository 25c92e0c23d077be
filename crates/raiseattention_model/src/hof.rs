//! The fixed higher-order-function registry.
//!
//! Shared between the Syntax Visitor (which decides, purely syntactically,
//! whether a call site's arguments are worth recording as callable-argument
//! hints at all) and the Signature Engine (which decides whether an
//! *unresolved* callee is a known HOF worth consulting those hints for).

/// Keyword argument names that always mark their value as a callable-hint
/// candidate, regardless of which function is being called.
pub const KEYWORD_HINT_NAMES: &[&str] = &["key", "func", "default_factory", "target", "callback"];

/// Callees (matched by short/rightmost name) whose *first positional*
/// argument is treated as a callable-hint candidate.
pub const FIRST_POSITIONAL_CALLABLE: &[&str] = &[
    "map",
    "filter",
    "sorted",
    "min",
    "max",
    "reduce",
    "starmap",
    "filterfalse",
    "takewhile",
    "dropwhile",
    "groupby",
    "submit",
    "create_task",
    "ensure_future",
];

/// Callees commonly invoked with a `key=` callable. Kept separate from
/// [`KEYWORD_HINT_NAMES`] for documentation purposes: the keyword-based
/// hint capture in the visitor
/// does not actually need to check callee identity, since `key=` is
/// recognised on any call, but the Signature Engine cross-checks this list
/// when deciding whether an *unresolved* callee is a recognised HOF at all.
pub const KEY_CALLABLE: &[&str] = &["sorted", "min", "max", "nlargest", "nsmallest"];

/// Returns `true` if `short_name` (the callee's rightmost dotted segment)
/// is a recognised higher-order function under either registry.
#[must_use]
pub fn is_known_hof(short_name: &str) -> bool {
    FIRST_POSITIONAL_CALLABLE.contains(&short_name) || KEY_CALLABLE.contains(&short_name)
}
