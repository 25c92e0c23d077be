use rustc_hash::FxHashMap;

use crate::{Confidence, QualName};

/// Sentinel exception name used when a callee is known to be native-opaque
/// but the Stub Store has no record for it at all.
pub const EXCEPTION_POSSIBLE_NATIVE: &str = "PossibleNativeException";

/// Sentinel exception name used when a callee's docstring merely mentions
/// "raise"/"raises" with no further information, or when an unknown
/// decorator wraps a non-trivial signature.
pub const EXCEPTION_UNTYPED: &str = "Exception";

/// The may-raise signature of a function: a set of exception class names,
/// each tagged with how confident the engine is that the exception can
/// actually reach this function's caller.
///
/// Equality deliberately ignores insertion order: two `ExceptionSet`s built
/// by visiting call sites in a different order, but containing the same
/// (name, confidence) pairs, compare equal. This falls out of using a hash
/// map rather than a vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExceptionSet {
    entries: FxHashMap<QualName, Confidence>,
}

impl ExceptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(name: impl Into<QualName>, confidence: Confidence) -> Self {
        let mut set = Self::new();
        set.insert(name, confidence);
        set
    }

    /// Insert `name` with `confidence`. If the name is already present, the
    /// stored confidence is merged (lower wins, per [`Confidence::merge`]).
    pub fn insert(&mut self, name: impl Into<QualName>, confidence: Confidence) {
        let name = name.into();
        self.entries
            .entry(name)
            .and_modify(|existing| *existing = existing.merge(confidence))
            .or_insert(confidence);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.keys().any(|key| key.as_str() == name)
    }

    #[must_use]
    pub fn confidence_of(&self, name: &str) -> Option<Confidence> {
        self.entries
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, confidence)| *confidence)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QualName, Confidence)> {
        self.entries.iter().map(|(name, confidence)| (name, *confidence))
    }

    /// Merge `other` into `self` in place: union of keys, lower confidence
    /// wins on collision. Returns `true` if `self` changed, which the
    /// Signature Engine's worklist fixpoint uses to decide whether to
    /// re-enqueue callers.
    pub fn merge_from(&mut self, other: &ExceptionSet) -> bool {
        let mut changed = false;
        for (name, confidence) in other.iter() {
            let before = self.entries.get(name).copied();
            self.insert(name.clone(), confidence);
            if self.entries.get(name).copied() != before {
                changed = true;
            }
        }
        changed
    }

    /// Returns a new set containing every entry of `self` not present in
    /// `handled` (by exact qualname match). Used for `sig(f) \ handled_at(c)`,
    /// and for the analogous `unhandled(c) = raw(c) \ handled_at(c)` computed
    /// by the Diagnostic Engine, though the latter matches on short/rightmost
    /// names rather than exact qualnames and so uses
    /// [`ExceptionSet::retain_unmatched`] instead.
    #[must_use]
    pub fn difference(&self, handled: &ExceptionSet) -> ExceptionSet {
        let mut result = ExceptionSet::new();
        for (name, confidence) in self.iter() {
            if !handled.contains(name.as_str()) {
                result.insert(name.clone(), confidence);
            }
        }
        result
    }

    /// Like [`ExceptionSet::difference`], but the predicate decides whether
    /// to keep each entry by its short (rightmost) name, so that a handler
    /// written as `JSONDecodeError` still matches a raised
    /// `json.JSONDecodeError`.
    #[must_use]
    pub fn retain_unmatched(&self, is_handled_short_name: impl Fn(&str) -> bool) -> ExceptionSet {
        let mut result = ExceptionSet::new();
        for (name, confidence) in self.iter() {
            if !is_handled_short_name(name.short_name()) {
                result.insert(name.clone(), confidence);
            }
        }
        result
    }

    /// Remove a single exception by exact qualname, if present. Used by
    /// inline-ignore suppression.
    pub fn remove(&mut self, name: &str) -> bool {
        let key = self
            .entries
            .keys()
            .find(|key| key.as_str() == name)
            .cloned();
        match key {
            Some(key) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }
}

impl FromIterator<(QualName, Confidence)> for ExceptionSet {
    fn from_iter<T: IntoIterator<Item = (QualName, Confidence)>>(iter: T) -> Self {
        let mut set = ExceptionSet::new();
        for (name, confidence) in iter {
            set.insert(name, confidence);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_insertion_order() {
        let mut a = ExceptionSet::new();
        a.insert("ValueError", Confidence::Exact);
        a.insert("KeyError", Confidence::Likely);

        let mut b = ExceptionSet::new();
        b.insert("KeyError", Confidence::Likely);
        b.insert("ValueError", Confidence::Exact);

        assert_eq!(a, b);
    }

    #[test]
    fn merge_from_takes_lower_confidence_on_collision() {
        let mut a = ExceptionSet::single("ValueError", Confidence::Exact);
        let b = ExceptionSet::single("ValueError", Confidence::Conservative);
        let changed = a.merge_from(&b);
        assert!(changed);
        assert_eq!(a.confidence_of("ValueError"), Some(Confidence::Conservative));
    }

    #[test]
    fn merge_from_reports_no_change_when_stable() {
        let mut a = ExceptionSet::single("ValueError", Confidence::Conservative);
        let b = ExceptionSet::single("ValueError", Confidence::Exact);
        assert!(!a.merge_from(&b));
    }

    #[test]
    fn difference_removes_exact_matches_only() {
        let mut raw = ExceptionSet::new();
        raw.insert("ValueError", Confidence::Exact);
        raw.insert("json.JSONDecodeError", Confidence::Exact);

        let handled = ExceptionSet::single("ValueError", Confidence::Exact);
        let remaining = raw.difference(&handled);
        assert!(!remaining.contains("ValueError"));
        assert!(remaining.contains("json.JSONDecodeError"));
    }

    #[test]
    fn retain_unmatched_uses_short_name() {
        let mut raw = ExceptionSet::new();
        raw.insert("json.JSONDecodeError", Confidence::Exact);
        let remaining = raw.retain_unmatched(|short| short == "JSONDecodeError");
        assert!(remaining.is_empty());
    }
}
