use std::fmt;

/// A dotted name, fully or partially qualified.
///
/// Used both for function qualnames (`module.ClassName.method`) and for
/// exception class names (`json.decoder.JSONDecodeError`). Kept as an owned
/// `String` internally rather than a segment vector: qualnames are mostly
/// compared and hashed wholesale, and only occasionally split into segments
/// (e.g. to get the "rightmost" short name for hierarchy matching).
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct QualName(String);

impl QualName {
    pub fn new(dotted: impl Into<String>) -> Self {
        Self(dotted.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final dotted segment, e.g. `JSONDecodeError` for
    /// `json.decoder.JSONDecodeError`. Used by the Diagnostic Engine to
    /// match externally-qualified exception classes against short handler
    /// names.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    #[must_use]
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Join this qualname with a child segment, e.g. `Foo` + `method` ->
    /// `Foo.method`.
    #[must_use]
    pub fn join(&self, segment: &str) -> QualName {
        QualName(format!("{}.{segment}", self.0))
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QualName {
    fn from(value: &str) -> Self {
        QualName::new(value)
    }
}

impl From<String> for QualName {
    fn from(value: String) -> Self {
        QualName::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_takes_last_segment() {
        assert_eq!(QualName::new("json.decoder.JSONDecodeError").short_name(), "JSONDecodeError");
        assert_eq!(QualName::new("ValueError").short_name(), "ValueError");
    }

    #[test]
    fn join_appends_segment() {
        assert_eq!(QualName::new("pkg.mod").join("Foo").as_str(), "pkg.mod.Foo");
    }
}
