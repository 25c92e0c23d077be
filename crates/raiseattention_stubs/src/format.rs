//! The on-disk stub database JSON format: a `metadata` object plus one key
//! per module name, each holding a `class -> method -> (exception ->
//! confidence)` tree. The module-level functions live under the
//! empty-string class key.

use rustc_hash::FxHashMap;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StubMetadata {
    pub name: String,
    pub version: String,
    pub format_version: String,
    pub generator: String,
    #[serde(default)]
    pub package: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StubFile {
    pub metadata: StubMetadata,
    #[serde(flatten)]
    pub modules: FxHashMap<String, RawModule>,
}

/// `class name -> method name -> exception map`. The module-level
/// functions are keyed under the empty string.
pub type RawModule = FxHashMap<String, RawClass>;

pub type RawClass = FxHashMap<String, RawExceptionMap>;

/// Either an explicit `exception -> confidence-string` mapping, or a bare
/// list of exception names, which is shorthand for "every listed exception
/// at `likely` confidence.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawExceptionMap {
    List(Vec<String>),
    Map(FxHashMap<String, String>),
}
