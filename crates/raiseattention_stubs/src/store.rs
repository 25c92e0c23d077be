use std::path::Path;
use std::str::FromStr;

use pep440_rs::{Version, VersionSpecifiers};
use rustc_hash::FxHashMap;

use raiseattention_model::{Confidence, ExceptionSet, StubRecord, EXCEPTION_POSSIBLE_NATIVE};

use crate::error::StubError;
use crate::format::{RawClass, RawExceptionMap, RawModule, StubFile};

/// method name -> may-raise signature.
type MethodTable = FxHashMap<String, ExceptionSet>;
/// class name ("" denotes module-level functions) -> MethodTable.
type ClassTable = FxHashMap<String, MethodTable>;

/// The in-memory Stub Store: every stub file loaded at start-up, merged
/// into one `module -> class -> method -> ExceptionSet` index. Immutable
/// once built -- native-stub data loaded at start-up is never mutated for
/// the lifetime of the process.
#[derive(Debug, Default)]
pub struct StubStore {
    modules: FxHashMap<String, ClassTable>,
}

impl StubStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from only the stub data embedded in the binary.
    pub fn with_embedded_defaults(target_language_version: &Version) -> Result<Self, StubError> {
        let mut store = Self::new();
        store.load_str(crate::BUILTIN_STUBS_JSON, target_language_version)?;
        Ok(store)
    }

    /// Parses `contents` as one stub database file and merges it in, if its
    /// `metadata.version` specifier accepts `target_language_version`.
    /// Returns `true` if the file applied, `false` if it was skipped due to
    /// a version mismatch, which is not an error: a stub file only applies
    /// when its `version` specifier accepts the target language version.
    pub fn load_str(
        &mut self,
        contents: &str,
        target_language_version: &Version,
    ) -> Result<bool, StubError> {
        let file: StubFile = serde_json::from_str(contents)?;
        let specifier =
            VersionSpecifiers::from_str(&file.metadata.version).map_err(|source| {
                StubError::InvalidSpecifier {
                    specifier: file.metadata.version.clone(),
                    source,
                }
            })?;
        if !specifier.contains(target_language_version) {
            return Ok(false);
        }
        for (module_name, raw_module) in file.modules {
            self.merge_module(module_name, raw_module)?;
        }
        Ok(true)
    }

    /// Loads every `*.json` file directly under `dir` (a user-supplied
    /// override directory) and merges each that applies. Returns the number
    /// of files actually merged. A malformed file is skipped, not
    /// propagated, so the caller should log the error itself and continue.
    pub fn load_dir(
        &mut self,
        dir: &Path,
        target_language_version: &Version,
    ) -> Result<usize, StubError> {
        let mut applied = 0;
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(0),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            if self.load_str(&contents, target_language_version)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    fn merge_module(&mut self, name: String, raw: RawModule) -> Result<(), StubError> {
        let class_table = self.modules.entry(name).or_default();
        for (class_name, raw_class) in raw {
            merge_class(class_table, class_name, raw_class)?;
        }
        Ok(())
    }

    /// The stub lookup algorithm.
    ///
    /// 1. Exact match on `(module, class, method)`.
    /// 2. If `class` has no entry for `method`, scan every *other* class in
    ///    the same module for a matching method name, returning
    ///    `fuzzy = true` (handles native class-name mismatches like `mmap`
    ///    vs `Mmap_object`).
    ///
    /// The scan in step 2 never leaves the requested module, so an exact
    /// match in the requested module always wins over any same-named method
    /// that might exist in some other module's stubs -- there is no
    /// cross-module fuzzy search at all.
    #[must_use]
    pub fn lookup(&self, module: &str, class: &str, method: &str) -> Option<StubRecord> {
        let class_table = self.modules.get(module)?;
        if let Some(method_table) = class_table.get(class) {
            if let Some(set) = method_table.get(method) {
                return Some(StubRecord::new(
                    set.clone(),
                    format!("{module}.{class}.{method}"),
                    false,
                ));
            }
        }
        for (candidate_class, method_table) in class_table {
            if candidate_class == class {
                continue;
            }
            if let Some(set) = method_table.get(method) {
                return Some(StubRecord::new(
                    set.clone(),
                    format!("{module}.{candidate_class}.{method} (fuzzy)"),
                    true,
                ));
            }
        }
        None
    }

    /// [`Self::lookup`], falling back to `{PossibleNativeException:
    /// conservative}` when nothing matched but the callee is known to be
    /// native.
    #[must_use]
    pub fn lookup_or_native(
        &self,
        module: &str,
        class: &str,
        method: &str,
        is_known_native: bool,
    ) -> Option<StubRecord> {
        if let Some(record) = self.lookup(module, class, method) {
            return Some(record);
        }
        if is_known_native {
            return Some(StubRecord::new(
                ExceptionSet::single(EXCEPTION_POSSIBLE_NATIVE, Confidence::Conservative),
                "native-fallback (no stub)",
                false,
            ));
        }
        None
    }
}

fn merge_class(
    class_table: &mut ClassTable,
    class_name: String,
    raw_class: RawClass,
) -> Result<(), StubError> {
    let method_table = class_table.entry(class_name).or_default();
    for (method_name, raw_exceptions) in raw_class {
        let set = exception_set_from_raw(raw_exceptions)?;
        method_table
            .entry(method_name)
            .and_modify(|existing| {
                existing.merge_from(&set);
            })
            .or_insert(set);
    }
    Ok(())
}

fn exception_set_from_raw(raw: RawExceptionMap) -> Result<ExceptionSet, StubError> {
    let mut set = ExceptionSet::new();
    match raw {
        RawExceptionMap::List(names) => {
            for name in names {
                set.insert(name, Confidence::Likely);
            }
        }
        RawExceptionMap::Map(map) => {
            for (name, confidence_str) in map {
                set.insert(name, parse_confidence(&confidence_str)?);
            }
        }
    }
    Ok(set)
}

fn parse_confidence(raw: &str) -> Result<Confidence, StubError> {
    match raw.to_ascii_lowercase().as_str() {
        "conservative" => Ok(Confidence::Conservative),
        "likely" => Ok(Confidence::Likely),
        "exact" => Ok(Confidence::Exact),
        "manual" => Ok(Confidence::Manual),
        _ => Err(StubError::UnknownConfidence(raw.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(version: &str) -> Version {
        Version::from_str(version).expect("valid version")
    }

    #[test]
    fn embedded_defaults_resolve_open_stub() {
        let store = StubStore::with_embedded_defaults(&v("3.11")).expect("loads");
        let record = store.lookup("builtins", "", "open").expect("stub present");
        for name in [
            "FileNotFoundError",
            "PermissionError",
            "IsADirectoryError",
            "NotADirectoryError",
            "FileExistsError",
            "OSError",
            "ValueError",
            "TypeError",
            "LookupError",
        ] {
            assert!(record.exceptions.contains(name), "missing {name}");
        }
        assert!(!record.fuzzy_match);
    }

    #[test]
    fn fuzzy_match_scans_other_classes_in_same_module() {
        let store = StubStore::with_embedded_defaults(&v("3.11")).expect("loads");
        let record = store
            .lookup("mmap", "mmap", "resize")
            .expect("fuzzy stub present");
        assert!(record.fuzzy_match);
        assert!(record.exceptions.contains("OSError"));
    }

    #[test]
    fn unknown_callee_with_no_stub_returns_none() {
        let store = StubStore::with_embedded_defaults(&v("3.11")).expect("loads");
        assert!(store.lookup("nonexistent", "", "nope").is_none());
    }

    #[test]
    fn native_fallback_only_applies_when_flagged() {
        let store = StubStore::with_embedded_defaults(&v("3.11")).expect("loads");
        assert!(store
            .lookup_or_native("nonexistent", "", "nope", false)
            .is_none());
        let record = store
            .lookup_or_native("nonexistent", "", "nope", true)
            .expect("native fallback");
        assert!(record.exceptions.contains(EXCEPTION_POSSIBLE_NATIVE));
    }

    #[test]
    fn version_specifier_mismatch_skips_file_without_error() {
        let mut store = StubStore::new();
        let applied = store
            .load_str(
                r#"{"metadata":{"name":"x","version":"<1.0","format_version":"2.0","generator":"manual"},"x":{"":{"f":{"ValueError":"exact"}}}}"#,
                &v("3.11"),
            )
            .expect("parses");
        assert!(!applied);
        assert!(store.lookup("x", "", "f").is_none());
    }

    #[test]
    fn list_shorthand_means_all_likely_confidence() {
        let mut store = StubStore::new();
        store
            .load_str(
                r#"{"metadata":{"name":"x","version":">=1.0","format_version":"2.0","generator":"manual"},"x":{"":{"f":["ValueError","TypeError"]}}}"#,
                &v("3.11"),
            )
            .expect("applies");
        let record = store.lookup("x", "", "f").expect("present");
        assert_eq!(
            record.exceptions.confidence_of("ValueError"),
            Some(Confidence::Likely)
        );
    }

    #[test]
    fn merging_two_sources_keeps_lower_confidence() {
        let mut store = StubStore::new();
        store
            .load_str(
                r#"{"metadata":{"name":"a","version":">=1.0","format_version":"2.0","generator":"manual"},"x":{"":{"f":{"ValueError":"exact"}}}}"#,
                &v("3.11"),
            )
            .expect("applies");
        store
            .load_str(
                r#"{"metadata":{"name":"b","version":">=1.0","format_version":"2.0","generator":"manual"},"x":{"":{"f":{"ValueError":"conservative"}}}}"#,
                &v("3.11"),
            )
            .expect("applies");
        let record = store.lookup("x", "", "f").expect("present");
        assert_eq!(
            record.exceptions.confidence_of("ValueError"),
            Some(Confidence::Conservative)
        );
    }

    #[test]
    fn unknown_confidence_string_is_reported() {
        let mut store = StubStore::new();
        let err = store
            .load_str(
                r#"{"metadata":{"name":"x","version":">=1.0","format_version":"2.0","generator":"manual"},"x":{"":{"f":{"ValueError":"super-sure"}}}}"#,
                &v("3.11"),
            )
            .unwrap_err();
        assert!(matches!(err, StubError::UnknownConfidence(_)));
    }
}
