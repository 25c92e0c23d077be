use sha2::{Digest, Sha256};

/// Hex-encoded sha256 of `bytes`, used throughout for both tiers' content
/// hashes and for the combined key that names an on-disk entry file.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").expect("writing to a String never fails");
    }
    out
}

/// File-level tier key: `(absolute_path, sha256(content))`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FileCacheKey {
    pub path: String,
    pub content_hash: String,
}

impl FileCacheKey {
    #[must_use]
    pub fn new(path: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_hash: content_hash.into(),
        }
    }

    /// The content-addressed digest naming this entry's on-disk file.
    #[must_use]
    pub fn digest(&self) -> String {
        sha256_hex(format!("{}\0{}", self.path, self.content_hash).as_bytes())
    }
}

/// Signature-level tier key: `(function_qualname,
/// sha256(content of module), hash of transitive-dependency signatures)`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SignatureCacheKey {
    pub function_qualname: String,
    pub module_hash: String,
    pub dependency_signatures_hash: String,
}

impl SignatureCacheKey {
    #[must_use]
    pub fn new(
        function_qualname: impl Into<String>,
        module_hash: impl Into<String>,
        dependency_signatures_hash: impl Into<String>,
    ) -> Self {
        Self {
            function_qualname: function_qualname.into(),
            module_hash: module_hash.into(),
            dependency_signatures_hash: dependency_signatures_hash.into(),
        }
    }

    #[must_use]
    pub fn digest(&self) -> String {
        sha256_hex(
            format!(
                "{}\0{}\0{}",
                self.function_qualname, self.module_hash, self.dependency_signatures_hash
            )
            .as_bytes(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_changes_with_any_component() {
        let a = FileCacheKey::new("/x.py", "abc");
        let b = FileCacheKey::new("/x.py", "def");
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn digest_is_stable_for_same_inputs() {
        let a = SignatureCacheKey::new("m::f", "h1", "h2");
        let b = SignatureCacheKey::new("m::f", "h1", "h2");
        assert_eq!(a.digest(), b.digest());
    }
}
