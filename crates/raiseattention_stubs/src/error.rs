/// Everything that can go wrong loading a stub file. A parse failure is
/// logged and the stub ignored, never fatal -- this type exists so the
/// caller can do exactly that without matching on strings.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    #[error("malformed stub JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid version specifier {specifier:?}: {source}")]
    InvalidSpecifier {
        specifier: String,
        #[source]
        source: pep440_rs::Pep440Error,
    },

    #[error("unknown confidence level {0:?} (expected one of conservative/likely/exact/manual)")]
    UnknownConfidence(String),

    #[error("failed to read stub override directory: {0}")]
    Io(#[from] std::io::Error),
}
