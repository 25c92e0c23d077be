use raiseattention_model::{Module, QualName};

use crate::key::FunctionKey;

/// Same-module resolution: a plain call to a sibling function, a
/// `self.`/`cls.` method call rewritten against the enclosing class, or a
/// bare call to a locally-defined class's constructor.
#[must_use]
pub fn resolve_local(module: &Module, caller_key: &FunctionKey, callee: &QualName) -> Option<QualName> {
    if module.find_function(callee).is_some() {
        return Some(callee.clone());
    }
    if let Some(rewritten) = resolve_self_call(caller_key, callee) {
        if module.find_function(&rewritten).is_some() {
            return Some(rewritten);
        }
    }
    let ctor = callee.join("__init__");
    if module.find_function(&ctor).is_some() {
        return Some(ctor);
    }
    None
}

/// Rewrites `self.method`/`cls.method` against the class prefix of the
/// caller's own qualname (`Widget.render` -> caller's class is `Widget`).
/// Non-method callers (no `.` in their qualname) never match a `self.`/
/// `cls.` callee: there is no enclosing class to rewrite against.
fn resolve_self_call(caller_key: &FunctionKey, callee: &QualName) -> Option<QualName> {
    let mut segments = callee.segments();
    let first = segments.next()?;
    if first != "self" && first != "cls" {
        return None;
    }
    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        return None;
    }
    let (class_prefix, _) = caller_key.function.as_str().rsplit_once('.')?;
    Some(QualName::new(format!("{class_prefix}.{}", rest.join("."))))
}

/// The module a native-flagged call site should be looked up under, when no
/// import table entry ever pointed at it (e.g. a bare built-in identifier
/// like `open(...)`, which lives in the `builtins` namespace).
#[must_use]
pub fn guess_module(callee: &QualName) -> QualName {
    let segments: Vec<&str> = callee.segments().collect();
    if segments.len() <= 1 {
        QualName::new("builtins")
    } else {
        QualName::new(segments[..segments.len() - 1].join("."))
    }
}
