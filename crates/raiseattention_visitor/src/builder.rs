use raiseattention_model::{
    CallInfo, ExceptHandler, FunctionFlags, FunctionInfo, Location, QualName, TryScope, TryScopeId,
};

/// The `except ... as name:` binding active while walking one handler's
/// body, kept on a stack so a bare `raise` or `raise name` inside nested
/// `try` statements resolves against the *innermost* enclosing handler.
pub(crate) struct HandlerBinding {
    pub as_name: Option<String>,
    pub caught: Vec<QualName>,
    pub is_universal: bool,
}

/// Accumulates one [`FunctionInfo`] (or the module-level `<module>`
/// pseudo-function) while the walker descends through its body. A new
/// `FunctionBuilder` is pushed for each nested `def`/pseudo-function and
/// popped once its body has been fully walked -- calls, raises and
/// try-scopes never leak between a function and the functions nested inside
/// it: each belongs to exactly the `FunctionInfo` it is syntactically
/// nested in, not any ancestor.
pub(crate) struct FunctionBuilder {
    pub info: FunctionInfo,
    next_try_id: u32,
    try_stack: Vec<TryScopeId>,
    handler_stack: Vec<HandlerBinding>,
}

impl FunctionBuilder {
    pub(crate) fn new(qualname: QualName, location: Location, flags: FunctionFlags) -> Self {
        let mut info = FunctionInfo::new(qualname, location);
        info.flags = flags;
        Self {
            info,
            next_try_id: 0,
            try_stack: Vec::new(),
            handler_stack: Vec::new(),
        }
    }

    pub(crate) fn enclosing_try_scopes(&self) -> Vec<TryScopeId> {
        self.try_stack.clone()
    }

    pub(crate) fn record_call(&mut self, call: CallInfo) {
        self.info.calls.push(call);
    }

    pub(crate) fn record_direct_raise(&mut self, exception: QualName) {
        self.info.direct_raises.push((exception, true));
    }

    pub(crate) fn begin_try(&mut self) -> TryScopeId {
        let id = TryScopeId(self.next_try_id);
        self.next_try_id += 1;
        self.try_stack.push(id);
        id
    }

    /// Pops the try id pushed by [`Self::begin_try`]: called once the try's
    /// guarded body (not its handlers/orelse/finally) has been walked.
    pub(crate) fn end_try_body(&mut self) {
        self.try_stack.pop();
    }

    pub(crate) fn finish_try(&mut self, scope: TryScope) {
        self.info.try_scopes.push(scope);
    }

    pub(crate) fn enter_handler(&mut self, handler: &ExceptHandler) {
        self.handler_stack.push(HandlerBinding {
            as_name: handler.as_name.clone(),
            caught: handler.caught.clone(),
            is_universal: handler.is_universal,
        });
    }

    pub(crate) fn exit_handler(&mut self) {
        self.handler_stack.pop();
    }

    /// Returns the innermost handler binding, if any (for bare `raise`).
    pub(crate) fn innermost_handler(&self) -> Option<&HandlerBinding> {
        self.handler_stack.last()
    }

    /// Finds the innermost handler whose `as name:` binding matches `name`
    /// (for `raise name`), searching from the innermost handler outward.
    pub(crate) fn handler_bound_to(&self, name: &str) -> Option<&HandlerBinding> {
        self.handler_stack
            .iter()
            .rev()
            .find(|binding| binding.as_name.as_deref() == Some(name))
    }

    pub(crate) fn mark_bare_raise(&mut self) {
        self.info.flags.has_bare_raise = true;
    }
}
