use std::cmp::Ordering;

/// How trustworthy an entry in an [`ExceptionSet`](crate::ExceptionSet) is.
///
/// Ordered from least to most trustworthy. When two sources disagree on
/// whether a function may raise a given exception, the *lower* confidence
/// wins: it is always safe to believe the more cautious source.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub enum Confidence {
    /// Inferred by a fallback rule (e.g. "docstring mentions raise").
    Conservative,
    /// Inferred from a stub with a fuzzy class-name match, or propagated
    /// through a higher-order-function pattern.
    Likely,
    /// Observed directly: a literal `raise X(...)` or an exact stub match.
    Exact,
    /// Hand-curated by a human maintaining the stub database.
    Manual,
}

impl Confidence {
    /// The confidence that should win when the same exception is reported
    /// by two different sources. Lower (more cautious) always wins.
    #[must_use]
    pub fn merge(self, other: Confidence) -> Confidence {
        match self.cmp(&other) {
            Ordering::Less | Ordering::Equal => self,
            Ordering::Greater => other,
        }
    }
}
