use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use raiseattention_config::Config;
use raiseattention_model::{
    decorators, hof, CallableHint, Confidence, ExceptionSet, FunctionInfo, HandledSet, Module,
    QualName, EXCEPTION_POSSIBLE_NATIVE, EXCEPTION_UNTYPED,
};
use raiseattention_resolver::{follow_reexport, ExternalResolver, Resolution};
use raiseattention_stubs::StubStore;

use crate::key::FunctionKey;
use crate::resolve;

/// Knobs that change how the fixpoint treats calls it cannot fully resolve
/// (the CLI's `--local` / `--no-warn-native` flags).
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// `--local`: skip external-module analysis entirely. Native and
    /// external callees contribute nothing, regardless of `warn_native`.
    pub local_only: bool,
    /// Whether an unresolved call to a native-classified module that has no
    /// stub at all contributes `PossibleNativeException`.
    pub warn_native: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            local_only: false,
            warn_native: true,
        }
    }
}

/// What a call site's callee resolved to, for the purposes of picking which
/// `ExceptionSet` to propagate.
enum CalleeOutcome {
    /// Resolved to a function whose current (possibly still-growing)
    /// signature should be propagated.
    Function(FunctionKey),
    /// Resolved to a stub (including the `PossibleNativeException`
    /// fallback, which is represented as an ordinary one-entry stub set so
    /// callers don't need a separate case).
    Stub(ExceptionSet),
    /// The callee's owning module is mid-resolution on the active stack
    /// (an import cycle); nothing to contribute this round.
    Pending,
    /// Nothing in local scope, the external resolver, or the stub store
    /// knows what this callee is.
    Unresolved,
}

/// The inter-procedural fixpoint.
///
/// Computes `sig(f): ExceptionSet` for every function reachable from a root
/// module: seeded from direct raises, then repeatedly propagated through
/// calls (resolved locally, externally, or via the Stub Store), callable-
/// argument hints for known higher-order functions, and decorators, until
/// no signature changes and every function's reachable callers have been
/// revisited.
///
/// [`Self::analyze`] runs in two passes. The first discovers the full
/// reachable module/function set -- calls into not-yet-registered modules
/// only turn up new functions as they resolve, so this has to repeat until
/// the function set itself stops growing -- and, as a byproduct, builds a
/// reverse call-graph index (`callers_of`: callee -> every caller that has
/// resolved a call to it). The second pass drains a worklist seeded from
/// that whole set: when propagating a function changes its signature, only
/// its recorded callers are re-enqueued, so the bulk of convergence (which
/// can take as many rounds as the longest call chain) touches only the
/// subgraph a change actually reaches, not the whole program.
///
/// Holds its working state (`modules`, `signatures`, `callers_of`) behind
/// `RefCell` rather than taking `&mut self` throughout, since the recursive
/// shape of callee resolution (a call inside function A may need to resolve
/// and seed a brand-new module before A's own propagation step finishes)
/// does not nest cleanly under ordinary mutable borrows -- the same shape
/// the External Resolver this crate sits on top of already uses for its own
/// per-path memoisation cache.
pub struct SignatureEngine<'a> {
    resolver: &'a ExternalResolver,
    stubs: &'a StubStore,
    config: &'a Config,
    options: EngineOptions,
    modules: RefCell<FxHashMap<QualName, Arc<Module>>>,
    signatures: RefCell<FxHashMap<FunctionKey, ExceptionSet>>,
    callers_of: RefCell<FxHashMap<FunctionKey, Vec<FunctionKey>>>,
    discovered: RefCell<Vec<FunctionKey>>,
}

impl<'a> SignatureEngine<'a> {
    #[must_use]
    pub fn new(resolver: &'a ExternalResolver, stubs: &'a StubStore, config: &'a Config, options: EngineOptions) -> Self {
        Self {
            resolver,
            stubs,
            config,
            options,
            modules: RefCell::new(FxHashMap::default()),
            signatures: RefCell::new(FxHashMap::default()),
            callers_of: RefCell::new(FxHashMap::default()),
            discovered: RefCell::new(Vec::new()),
        }
    }

    /// Runs the fixpoint starting from `root`, registered under
    /// `root_path`, and returns the final signature of every function
    /// discovered along the way (the root module's own functions, plus
    /// every external function transitively reached from them).
    pub fn analyze(&self, root_path: QualName, root: Arc<Module>) -> FxHashMap<FunctionKey, ExceptionSet> {
        self.register_module(root_path, root);

        // Pass 1: grow the module/function set to its fixed point. Module
        // discovery happens as a side effect of propagating calls, so this
        // has to keep rescanning every known function until a full round
        // adds nothing new -- but it also populates `callers_of`, which
        // pass 2 relies on to avoid ever doing this again.
        loop {
            let before = self.signatures.borrow().len();
            let keys: Vec<FunctionKey> = self.signatures.borrow().keys().cloned().collect();
            for key in &keys {
                self.propagate(key);
            }
            self.drain_discovered();
            if self.signatures.borrow().len() == before {
                break;
            }
        }

        // Pass 2: worklist over the now-stable function set, re-enqueuing
        // only the callers recorded for a function whose signature just
        // changed.
        let mut queue: VecDeque<FunctionKey> = self.signatures.borrow().keys().cloned().collect();
        let mut queued: FxHashSet<FunctionKey> = queue.iter().cloned().collect();
        while let Some(key) = queue.pop_front() {
            queued.remove(&key);
            if self.propagate(&key) {
                if let Some(callers) = self.callers_of.borrow().get(&key) {
                    for caller in callers {
                        if queued.insert(caller.clone()) {
                            queue.push_back(caller.clone());
                        }
                    }
                }
            }
        }

        self.signatures.borrow().clone()
    }

    /// Looks up a function's current signature, for callers (the
    /// Diagnostic Engine) that already hold a [`FunctionKey`] from a prior
    /// `analyze` call.
    #[must_use]
    pub fn signature_of(&self, key: &FunctionKey) -> Option<ExceptionSet> {
        self.signatures.borrow().get(key).cloned()
    }

    /// `raw(c) = sig(callee(c))`: the Diagnostic Engine's analogue of the
    /// contribution one call site makes during `propagate`, but returned
    /// whole rather than folded into a caller's signature and *not*
    /// subtracted by `handled_at(c)` -- the Diagnostic Engine does that
    /// subtraction itself, matching on short names rather than exact
    /// qualnames.
    #[must_use]
    pub fn raw_at_call(
        &self,
        module: &Module,
        caller_key: &FunctionKey,
        call: &raiseattention_model::CallInfo,
    ) -> ExceptionSet {
        let mut raw = ExceptionSet::new();
        let Some(callee) = &call.callee else {
            return raw;
        };
        if let Some(set) = self.resolve_to_set(callee, module, caller_key) {
            raw.merge_from(&set);
        }
        if hof::is_known_hof(callee.short_name()) {
            for (_, hint) in &call.callable_hints {
                if let CallableHint::Named(name) = hint {
                    if let Some(set) = self.resolve_to_set(name, module, caller_key) {
                        raw.merge_from(&set);
                    }
                }
            }
        }
        raw
    }

    #[must_use]
    pub fn module(&self, path: &QualName) -> Option<Arc<Module>> {
        self.modules.borrow().get(path).cloned()
    }

    /// Registers `module` under `path` and seeds every one of its
    /// functions with `sig₀ = direct_raises`, if not already present. Newly
    /// added keys are recorded in `discovered` rather than returned, since
    /// this is called both directly (the root module) and reentrantly from
    /// deep inside `propagate` (a cross-module call that discovers a new
    /// module mid-resolution).
    fn register_module(&self, path: QualName, module: Arc<Module>) {
        if self.modules.borrow().contains_key(&path) {
            return;
        }
        {
            let mut signatures = self.signatures.borrow_mut();
            let mut discovered = self.discovered.borrow_mut();
            for function in &module.functions {
                let key = FunctionKey::new(path.clone(), function.qualname.clone());
                if let std::collections::hash_map::Entry::Vacant(entry) = signatures.entry(key.clone()) {
                    entry.insert(seed_signature(function));
                    discovered.push(key);
                }
            }
        }
        self.modules.borrow_mut().insert(path, module);
    }

    fn drain_discovered(&self) -> Vec<FunctionKey> {
        self.discovered.borrow_mut().drain(..).collect()
    }

    /// Recomputes `sig(f)` for one function from its current call/decorator
    /// contributions and merges the result back in. Returns whether the
    /// stored signature changed.
    fn propagate(&self, key: &FunctionKey) -> bool {
        let Some(module) = self.modules.borrow().get(&key.module).cloned() else {
            return false;
        };
        let Some(function) = module.find_function(&key.function).cloned() else {
            return false;
        };

        let mut next = self.signatures.borrow().get(key).cloned().unwrap_or_default();
        let mut changed = false;

        for (name, _) in &function.direct_raises {
            changed |= insert_changed(&mut next, name.clone(), Confidence::Exact);
        }

        if self.decorator_contributes_conservative(&function, &module, key) {
            changed |= insert_changed(&mut next, EXCEPTION_UNTYPED, Confidence::Conservative);
        }

        for call in &function.calls {
            let handled = HandledSet::from_enclosing(&function.try_scopes, &call.enclosing_try_scopes);
            let mut raw = ExceptionSet::new();

            if let Some(callee) = &call.callee {
                if let Some(set) = self.resolve_to_set(callee, &module, key) {
                    raw.merge_from(&set);
                }

                if hof::is_known_hof(callee.short_name()) {
                    for (_, hint) in &call.callable_hints {
                        if let CallableHint::Named(name) = hint {
                            if let Some(set) = self.resolve_to_set(name, &module, key) {
                                raw.merge_from(&set);
                            }
                        }
                        // CallableHint::Lambda bodies are opaque: they
                        // contribute nothing.
                    }
                }
            }

            let contribution = raw.retain_unmatched(|short| handled.covers(short));
            changed |= next.merge_from(&contribution);
        }

        if changed {
            self.signatures.borrow_mut().insert(key.clone(), next);
        }
        changed
    }

    /// Records that `caller` resolved a call to `callee`, so a later change
    /// to `callee`'s signature re-enqueues `caller` in the worklist pass
    /// instead of requiring a full rescan.
    fn record_edge(&self, callee: &FunctionKey, caller: &FunctionKey) {
        let mut callers_of = self.callers_of.borrow_mut();
        let callers = callers_of.entry(callee.clone()).or_default();
        if !callers.contains(caller) {
            callers.push(caller.clone());
        }
    }

    /// Resolves one callee to the `ExceptionSet` it should contribute,
    /// recursing into the external resolver and registering any new module
    /// that resolution turns up.
    fn resolve_to_set(&self, callee: &QualName, module: &Module, caller_key: &FunctionKey) -> Option<ExceptionSet> {
        match self.resolve_callee(callee, module, caller_key) {
            CalleeOutcome::Function(key) => {
                self.record_edge(&key, caller_key);
                Some(self.signatures.borrow().get(&key).cloned().unwrap_or_default())
            }
            CalleeOutcome::Stub(set) => Some(set),
            CalleeOutcome::Pending | CalleeOutcome::Unresolved => None,
        }
    }

    fn resolve_callee(&self, callee: &QualName, module: &Module, caller_key: &FunctionKey) -> CalleeOutcome {
        if let Some(local) = resolve::resolve_local(module, caller_key, callee) {
            return CalleeOutcome::Function(FunctionKey::new(caller_key.module.clone(), local));
        }
        if self.options.local_only {
            return CalleeOutcome::Unresolved;
        }
        self.resolve_external(callee, module)
    }

    /// Substitutes the callee's leading segment through the calling
    /// module's import table, then asks the External Resolver to locate
    /// and parse (or classify as native) whatever remains.
    ///
    /// The module/function split always treats the *last* dotted segment
    /// as the function name and everything before it as the module path
    /// (trying the last *two* segments jointly as a `Class.method` qualname
    /// as a fallback). A deeper, progressively-widening submodule search
    /// (e.g. `pkg.sub.fn` when only `pkg` is bound by the import table) is
    /// not attempted.
    fn resolve_external(&self, callee: &QualName, module: &Module) -> CalleeOutcome {
        let segments: Vec<&str> = callee.segments().collect();
        let Some(&first) = segments.first() else {
            return CalleeOutcome::Unresolved;
        };

        let full_path: Vec<String> = match module.imports.get(first) {
            Some(bound) => bound
                .segments()
                .map(str::to_owned)
                .chain(segments[1..].iter().map(|s| (*s).to_owned()))
                .collect(),
            None => segments.iter().map(|s| (*s).to_owned()).collect(),
        };

        let (module_segments, function_name): (&[String], String) = if full_path.len() <= 1 {
            (&[], full_path.first().cloned().unwrap_or_default())
        } else {
            (&full_path[..full_path.len() - 1], full_path[full_path.len() - 1].clone())
        };
        let module_path = if module_segments.is_empty() {
            QualName::new("builtins")
        } else {
            QualName::new(module_segments.join("."))
        };

        if self.config.is_ignored_module(module_path.as_str()) {
            return CalleeOutcome::Unresolved;
        }

        let two_segment_name = (full_path.len() >= 2).then(|| full_path[full_path.len() - 2..].join("."));

        let importing_dir = module.source_path.as_deref().and_then(Path::parent);
        match self.resolver.resolve(&module_path, importing_dir) {
            Ok(Resolution::Source(resolved)) => {
                let found = find_in_module(&resolved, &function_name, two_segment_name.as_deref());
                match found {
                    Some(qualname) => {
                        self.register_module(module_path.clone(), Arc::clone(&resolved));
                        CalleeOutcome::Function(FunctionKey::new(module_path, qualname))
                    }
                    None => self
                        .follow_cross_module_reexport(&resolved, &function_name, importing_dir)
                        .unwrap_or(CalleeOutcome::Unresolved),
                }
            }
            Ok(Resolution::Native) => {
                let class = two_segment_name
                    .as_deref()
                    .and_then(|n| n.rsplit_once('.'))
                    .map(|(class, _)| class.to_owned())
                    .unwrap_or_default();
                if let Some(record) = self.stubs.lookup(module_path.as_str(), &class, &function_name) {
                    CalleeOutcome::Stub(record.exceptions)
                } else if self.options.warn_native {
                    CalleeOutcome::Stub(ExceptionSet::single(EXCEPTION_POSSIBLE_NATIVE, Confidence::Conservative))
                } else {
                    CalleeOutcome::Unresolved
                }
            }
            Ok(Resolution::Pending) => CalleeOutcome::Pending,
            Err(_) => CalleeOutcome::Unresolved,
        }
    }

    /// `resolved` has no function named `function_name` directly, but it
    /// re-exports that name from another module (`thing = other.thing` at
    /// module scope). Follows that single level of indirection into the
    /// target module and resolves `function_name` there instead.
    fn follow_cross_module_reexport(
        &self,
        resolved: &Arc<Module>,
        function_name: &str,
        importing_dir: Option<&Path>,
    ) -> Option<CalleeOutcome> {
        let target = follow_reexport(resolved, function_name)?;
        let target_segments: Vec<&str> = target.segments().collect();
        if target_segments.len() < 2 {
            return None;
        }
        let target_module = QualName::new(target_segments[..target_segments.len() - 1].join("."));
        let target_function = QualName::new(target_segments[target_segments.len() - 1]);

        if self.config.is_ignored_module(target_module.as_str()) {
            return Some(CalleeOutcome::Unresolved);
        }

        match self.resolver.resolve(&target_module, importing_dir).ok()? {
            Resolution::Source(target_resolved) => {
                let found = target_resolved.find_function(&target_function)?.qualname.clone();
                self.register_module(target_module.clone(), Arc::clone(&target_resolved));
                Some(CalleeOutcome::Function(FunctionKey::new(target_module, found)))
            }
            Resolution::Native => self
                .stubs
                .lookup(target_module.as_str(), "", target_function.as_str())
                .map(|record| CalleeOutcome::Stub(record.exceptions)),
            Resolution::Pending => Some(CalleeOutcome::Pending),
        }
    }

    /// An unknown (non-transparent) decorator that is itself defined in
    /// reachable source with a non-trivial signature contributes
    /// `Exception: conservative` to the decorated function. A decorator
    /// that only resolves to a native stub does not: the stub's own
    /// exception set already describes what the decorator itself may
    /// raise, not what it does to the function it wraps, so treating a
    /// stub hit the same as a reachable-source hit would over-attribute
    /// conservative exceptions to every function wrapped by a stubbed
    /// native decorator.
    fn decorator_contributes_conservative(&self, function: &FunctionInfo, module: &Module, caller_key: &FunctionKey) -> bool {
        function.decorators.iter().any(|decorator| {
            if decorators::is_transparent(decorator.short_name()) {
                return false;
            }
            match self.resolve_callee(decorator, module, caller_key) {
                CalleeOutcome::Function(key) => {
                    self.record_edge(&key, caller_key);
                    !self.signatures.borrow().get(&key).cloned().unwrap_or_default().is_empty()
                }
                _ => false,
            }
        })
    }
}

fn seed_signature(function: &FunctionInfo) -> ExceptionSet {
    let mut set = ExceptionSet::new();
    for (name, _) in &function.direct_raises {
        set.insert(name.clone(), Confidence::Exact);
    }
    set
}

fn insert_changed(set: &mut ExceptionSet, name: impl Into<QualName>, confidence: Confidence) -> bool {
    let name = name.into();
    let before = set.confidence_of(name.as_str());
    set.insert(name.clone(), confidence);
    set.confidence_of(name.as_str()) != before
}

fn find_in_module(module: &Module, function_name: &str, two_segment_name: Option<&str>) -> Option<QualName> {
    module
        .find_function(&QualName::new(function_name))
        .map(|f| f.qualname.clone())
        .or_else(|| {
            two_segment_name.and_then(|name| module.find_function(&QualName::new(name)).map(|f| f.qualname.clone()))
        })
        .or_else(|| {
            module
                .find_function(&QualName::new(format!("{function_name}.__init__")))
                .map(|f| f.qualname.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pep440_rs::Version;
    use std::fs;
    use std::str::FromStr;
    use test_case::test_case;

    fn engine_for<'a>(resolver: &'a ExternalResolver, stubs: &'a StubStore, config: &'a Config) -> SignatureEngine<'a> {
        SignatureEngine::new(resolver, stubs, config, EngineOptions::default())
    }

    fn default_config() -> Config {
        Config::resolve(
            raiseattention_config::PartialConfig::default(),
            raiseattention_config::PartialConfig::default(),
            raiseattention_config::PartialConfig::default(),
        )
        .expect("default config resolves")
    }

    fn visit(src: &str) -> Arc<Module> {
        Arc::new(
            raiseattention_visitor::visit_source(
                Path::new("root.py"),
                QualName::new("root"),
                raiseattention_model::ModuleKind::Project,
                src,
            )
            .expect("valid module"),
        )
    }

    fn stubs() -> StubStore {
        StubStore::with_embedded_defaults(&Version::from_str("3.11").unwrap()).expect("loads")
    }

    /// S1: a direct call to a function that unconditionally raises.
    #[test]
    fn s1_direct_call_propagates_callee_signature() {
        let root = visit(indoc! {"
            def r():
                raise ValueError(\"x\")

            def c():
                r()
        "});
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let config = default_config();
        let engine = engine_for(&resolver, &stub_store, &config);
        let signatures = engine.analyze(QualName::new("root"), root);

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("root"), QualName::new("c")))
            .expect("c has a signature");
        assert!(sig.contains("ValueError"));
    }

    /// S2: the same call, now guarded by a matching handler.
    #[test]
    fn s2_handled_call_contributes_nothing() {
        let root = visit(indoc! {"
            def r():
                raise ValueError(\"x\")

            def c():
                try:
                    r()
                except ValueError:
                    pass
        "});
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let config = default_config();
        let engine = engine_for(&resolver, &stub_store, &config);
        let signatures = engine.analyze(QualName::new("root"), root);

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("root"), QualName::new("c")))
            .expect("c has a signature");
        assert!(sig.is_empty());
    }

    /// S3: the `open` built-in's stubbed signature propagates through.
    #[test]
    fn s3_builtin_open_propagates_stub_signature() {
        let root = visit(indoc! {"
            def c():
                open(\"f.txt\", encoding=\"utf-8\")
        "});
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let config = default_config();
        let engine = engine_for(&resolver, &stub_store, &config);
        let signatures = engine.analyze(QualName::new("root"), root);

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("root"), QualName::new("c")))
            .expect("c has a signature");
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
            assert!(sig.contains(name), "missing {name}");
        }
    }

    /// S4: re-raise of a singly-typed bound handler variable contributes
    /// exactly that class, with no spurious "e" entry.
    #[test]
    fn s4_reraise_of_bound_variable_contributes_caught_class_only() {
        let root = visit(indoc! {"
            def r():
                raise ValueError()

            def handler():
                try:
                    r()
                except ValueError as e:
                    raise e
        "});
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let config = default_config();
        let engine = engine_for(&resolver, &stub_store, &config);
        let signatures = engine.analyze(QualName::new("root"), root);

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("root"), QualName::new("handler")))
            .expect("handler has a signature");
        assert!(sig.contains("ValueError"));
        assert!(!sig.contains("e"));
        assert_eq!(sig.len(), 1);
    }

    /// S5: a cross-module call, and cache invalidation when the callee's
    /// file changes.
    #[test]
    fn s5_cross_module_signature_updates_when_dependency_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let b_path = tmp.path().join("b.py");
        fs::write(&b_path, "def b():\n    raise KeyError()\n").unwrap();

        let a_src = indoc! {"
            import b

            def a():
                try:
                    b.b()
                except KeyError:
                    pass
        "};
        let mut root = raiseattention_visitor::visit_source(
            &tmp.path().join("a.py"),
            QualName::new("a"),
            raiseattention_model::ModuleKind::Project,
            a_src,
        )
        .unwrap();
        root.source_path = Some(tmp.path().join("a.py"));

        let resolver = ExternalResolver::new(vec![tmp.path().to_path_buf()], None, None);
        let stub_store = stubs();
        let config = default_config();

        {
            let engine = engine_for(&resolver, &stub_store, &config);
            let signatures = engine.analyze(QualName::new("a"), Arc::new(root.clone()));
            let sig = signatures
                .get(&FunctionKey::new(QualName::new("a"), QualName::new("a")))
                .expect("a has a signature");
            assert!(sig.is_empty(), "KeyError should be fully handled");
        }

        fs::write(&b_path, "def b():\n    raise IndexError()\n").unwrap();
        let resolver = ExternalResolver::new(vec![tmp.path().to_path_buf()], None, None);
        let engine = engine_for(&resolver, &stub_store, &config);
        let signatures = engine.analyze(QualName::new("a"), Arc::new(root));
        let sig = signatures
            .get(&FunctionKey::new(QualName::new("a"), QualName::new("a")))
            .expect("a has a signature");
        assert!(sig.contains("IndexError"));
    }

    /// S6: a higher-order function propagates its callable argument's
    /// signature; a lambda argument stays opaque.
    #[test]
    fn s6_hof_callable_hint_propagates_named_callback() {
        let root = visit(indoc! {"
            def risky(x):
                raise ValueError()

            def c(items):
                sorted(items, key=risky)
        "});
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let config = default_config();
        let engine = engine_for(&resolver, &stub_store, &config);
        let signatures = engine.analyze(QualName::new("root"), root);

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("root"), QualName::new("c")))
            .expect("c has a signature");
        assert!(sig.contains("ValueError"));
    }

    #[test]
    fn s6_hof_lambda_argument_is_opaque() {
        let root = visit(indoc! {"
            def c(items):
                sorted(items, key=lambda x: x.bad)
        "});
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let config = default_config();
        let options = EngineOptions {
            local_only: false,
            warn_native: false,
        };
        let engine = SignatureEngine::new(&resolver, &stub_store, &config, options);
        let signatures = engine.analyze(QualName::new("root"), root);

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("root"), QualName::new("c")))
            .expect("c has a signature");
        assert!(sig.is_empty());
    }

    #[test]
    fn local_only_suppresses_external_and_native_calls() {
        let root = visit(indoc! {"
            def c():
                open(\"f\")
        "});
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let config = default_config();
        let options = EngineOptions {
            local_only: true,
            warn_native: true,
        };
        let engine = SignatureEngine::new(&resolver, &stub_store, &config, options);
        let signatures = engine.analyze(QualName::new("root"), root);

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("root"), QualName::new("c")))
            .expect("c has a signature");
        assert!(sig.is_empty());
    }

    /// `ignore_modules` matching the callee's module suppresses the whole
    /// external call, the same way `--local` suppresses every external call
    /// -- but scoped to just the matched module rather than all of them.
    #[test]
    fn ignore_modules_config_skips_matched_external_module() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.py"), "def b():\n    raise KeyError()\n").unwrap();

        let a_src = "import b\n\ndef a():\n    b.b()\n";
        let mut root = raiseattention_visitor::visit_source(
            &tmp.path().join("a.py"),
            QualName::new("a"),
            raiseattention_model::ModuleKind::Project,
            a_src,
        )
        .unwrap();
        root.source_path = Some(tmp.path().join("a.py"));

        let resolver = ExternalResolver::new(vec![tmp.path().to_path_buf()], None, None);
        let stub_store = stubs();
        let config = Config::resolve(
            raiseattention_config::PartialConfig::default(),
            raiseattention_config::PartialConfig::default(),
            raiseattention_config::PartialConfig {
                ignore_modules: Some(vec!["b".to_string()]),
                ..raiseattention_config::PartialConfig::default()
            },
        )
        .unwrap();
        let engine = engine_for(&resolver, &stub_store, &config);
        let signatures = engine.analyze(QualName::new("a"), Arc::new(root));

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("a"), QualName::new("a")))
            .expect("a has a signature");
        assert!(sig.is_empty(), "ignored module's exceptions must not propagate");
    }

    /// An unknown decorator that resolves to a native stub (here, reusing
    /// the `open` builtin as a stand-in decorator) must not trigger the
    /// conservative fallback: the stub describes what the decorator itself
    /// raises, not what it does to its wrapped function.
    #[test_case("open", false; "native stub decorator contributes nothing")]
    #[test_case("wrapper", true; "reachable source decorator contributes Exception conservative")]
    fn decorator_conservative_contribution_requires_reachable_source(decorator: &str, expect_untyped: bool) {
        let source = format!("def wrapper(fn):\n    raise RuntimeError()\n\n@{decorator}\ndef f():\n    pass\n");
        let root = visit(&source);
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let config = default_config();
        let engine = engine_for(&resolver, &stub_store, &config);
        let signatures = engine.analyze(QualName::new("root"), root);

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("root"), QualName::new("f")))
            .expect("f has a signature");
        assert_eq!(sig.contains(EXCEPTION_UNTYPED), expect_untyped);
    }

    /// A three-link call chain (`c -> b -> a`) where `a`'s signature isn't
    /// seeded until after `c` and `b` have already been visited once:
    /// exercises the worklist re-enqueuing `b` then `c` via `callers_of`
    /// rather than relying on a full rescan to pick the change up.
    #[test]
    fn worklist_propagates_through_multi_hop_call_chain() {
        let root = visit(indoc! {"
            def a():
                raise ValueError()

            def b():
                a()

            def c():
                b()
        "});
        let resolver = ExternalResolver::new(vec![], None, None);
        let stub_store = stubs();
        let config = default_config();
        let engine = engine_for(&resolver, &stub_store, &config);
        let signatures = engine.analyze(QualName::new("root"), root);

        let sig = signatures
            .get(&FunctionKey::new(QualName::new("root"), QualName::new("c")))
            .expect("c has a signature");
        assert!(sig.contains("ValueError"));
    }
}
