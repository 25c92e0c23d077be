use ruff_python_ast::{
    Arguments,
    Comprehension, Decorator, ElifElseClause, Expr, ExprAttribute, ExprAwait, ExprBinOp,
    ExprBoolOp, ExprCall, ExprCompare, ExprDict, ExprDictComp, ExprFString, ExprGenerator,
    ExprIf, ExprListComp, ExprNamed, ExprSetComp, ExprSlice, ExprStarred, ExprSubscript,
    ExprUnaryOp, ExprYield, ExprYieldFrom, Parameters, Stmt, StmtAnnAssign, StmtAssert,
    StmtAssign, StmtAugAssign, StmtClassDef, StmtDelete, StmtFor, StmtFunctionDef, StmtIf,
    StmtMatch, StmtRaise, StmtReturn, StmtTry, StmtWhile, StmtWith, WithItem,
};
use ruff_text_size::Ranged;
use rustc_hash::FxHashSet;

use raiseattention_model::{
    hof, CallInfo, CallableHint, ExceptHandler, FunctionFlags, FunctionInfo, ImportTable,
    Location, QualName, TryScope,
};

use crate::builder::FunctionBuilder;
use crate::dotted::{expr_to_dotted, is_lambda};
use crate::imports::record_import;
use crate::locator::Locator;

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Class,
    Function,
}

/// Walks one module's statement tree, producing every [`FunctionInfo`] it
/// contains (including the module-level `<module>` pseudo-function) plus its
/// import table and module dependency set.
pub(crate) struct Walker<'a> {
    path: &'a std::path::Path,
    locator: Locator<'a>,
    scope_stack: Vec<(String, ScopeKind)>,
    finished: Vec<FunctionInfo>,
    pub(crate) imports: ImportTable,
    pub(crate) deps: FxHashSet<QualName>,
    /// Module-level `name = other.module.attr` bindings, followed one level
    /// deep for re-export purposes. Only recorded at module scope --
    /// not inside a function or class body, where the binding is a plain
    /// local/attribute assignment rather than a module-level re-export.
    pub(crate) reexports: rustc_hash::FxHashMap<String, QualName>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(path: &'a std::path::Path, source: &'a str) -> Self {
        Self {
            path,
            locator: Locator::new(source),
            scope_stack: Vec::new(),
            finished: Vec::new(),
            imports: ImportTable::default(),
            deps: FxHashSet::default(),
            reexports: rustc_hash::FxHashMap::default(),
        }
    }

    pub(crate) fn run(
        mut self,
        body: &[Stmt],
    ) -> (
        Vec<FunctionInfo>,
        ImportTable,
        FxHashSet<QualName>,
        rustc_hash::FxHashMap<String, QualName>,
    ) {
        let (start_line, end_line) = line_range_of(body, &self.locator);
        let location = Location::new(self.path, start_line, end_line);
        let mut module_fn =
            FunctionBuilder::new(QualName::new("<module>"), location, FunctionFlags::default());
        module_fn.info.docstring = crate::docstring::extract_docstring(body);
        self.walk_stmts(body, &mut module_fn);
        self.finished.push(module_fn.info);
        (self.finished, self.imports, self.deps, self.reexports)
    }

    fn current_qualname(&self, name: &str) -> QualName {
        if self.scope_stack.is_empty() {
            QualName::new(name)
        } else {
            let prefix = self
                .scope_stack
                .iter()
                .map(|(n, _)| n.as_str())
                .collect::<Vec<_>>()
                .join(".");
            QualName::new(format!("{prefix}.{name}"))
        }
    }

    /// Records `name = other.module.attr` as a one-level re-export when
    /// `targets` is a single plain name and `value` is a dotted name with
    /// more than one segment (a bare local alias like `name = other_name`
    /// is not useful to the resolver, which already has `other_name`
    /// itself to resolve).
    fn record_reexport(&mut self, targets: &[Expr], value: &Expr) {
        let [Expr::Name(target)] = targets else {
            return;
        };
        let Some(dotted) = expr_to_dotted(value) else {
            return;
        };
        if dotted.segments().count() > 1 {
            self.reexports.insert(target.id.to_string(), dotted);
        }
    }

    fn immediate_parent_is_class(&self) -> bool {
        matches!(self.scope_stack.last(), Some((_, ScopeKind::Class)))
    }

    fn walk_stmts(&mut self, stmts: &[Stmt], current: &mut FunctionBuilder) {
        for stmt in stmts {
            self.walk_stmt(stmt, current);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt, current: &mut FunctionBuilder) {
        match stmt {
            Stmt::FunctionDef(def) => self.walk_function_def(def, current),
            Stmt::ClassDef(def) => self.walk_class_def(def, current),
            Stmt::Return(StmtReturn { value, .. }) => {
                if let Some(value) = value {
                    self.walk_expr(value, current);
                }
            }
            Stmt::Delete(StmtDelete { targets, .. }) => {
                for target in targets {
                    self.walk_expr(target, current);
                }
            }
            Stmt::Assign(StmtAssign { targets, value, .. }) => {
                if self.scope_stack.is_empty() {
                    self.record_reexport(targets, value);
                }
                for target in targets {
                    self.walk_expr(target, current);
                }
                self.walk_expr(value, current);
            }
            Stmt::AugAssign(StmtAugAssign { target, value, .. }) => {
                self.walk_expr(target, current);
                self.walk_expr(value, current);
            }
            Stmt::AnnAssign(StmtAnnAssign { target, value, .. }) => {
                self.walk_expr(target, current);
                if let Some(value) = value {
                    self.walk_expr(value, current);
                }
            }
            Stmt::For(StmtFor {
                target,
                iter,
                body,
                orelse,
                ..
            }) => {
                self.walk_expr(target, current);
                self.walk_expr(iter, current);
                self.walk_stmts(body, current);
                self.walk_stmts(orelse, current);
            }
            Stmt::While(StmtWhile {
                test, body, orelse, ..
            }) => {
                self.walk_expr(test, current);
                self.walk_stmts(body, current);
                self.walk_stmts(orelse, current);
            }
            Stmt::If(StmtIf {
                test,
                body,
                elif_else_clauses,
                ..
            }) => {
                self.walk_expr(test, current);
                self.walk_stmts(body, current);
                for clause in elif_else_clauses {
                    self.walk_elif_else(clause, current);
                }
            }
            Stmt::With(StmtWith { items, body, .. }) => {
                for item in items {
                    self.walk_with_item(item, current);
                }
                self.walk_stmts(body, current);
            }
            Stmt::Match(StmtMatch { subject, cases, .. }) => {
                self.walk_expr(subject, current);
                for case in cases {
                    if let Some(guard) = &case.guard {
                        self.walk_expr(guard, current);
                    }
                    self.walk_stmts(&case.body, current);
                }
            }
            Stmt::Raise(raise) => self.walk_raise(raise, current),
            Stmt::Try(stmt_try) => self.walk_try(stmt_try, current),
            Stmt::Assert(StmtAssert { test, msg, .. }) => {
                self.walk_expr(test, current);
                if let Some(msg) = msg {
                    self.walk_expr(msg, current);
                }
            }
            Stmt::Import(_) | Stmt::ImportFrom(_) => {
                record_import(stmt, &mut self.imports, &mut self.deps);
            }
            Stmt::Expr(stmt_expr) => self.walk_expr(&stmt_expr.value, current),
            Stmt::Global(_)
            | Stmt::Nonlocal(_)
            | Stmt::Pass(_)
            | Stmt::Break(_)
            | Stmt::Continue(_)
            | Stmt::TypeAlias(_)
            | Stmt::IpyEscapeCommand(_) => {}
        }
    }

    fn walk_elif_else(&mut self, clause: &ElifElseClause, current: &mut FunctionBuilder) {
        if let Some(test) = &clause.test {
            self.walk_expr(test, current);
        }
        self.walk_stmts(&clause.body, current);
    }

    fn walk_with_item(&mut self, item: &WithItem, current: &mut FunctionBuilder) {
        self.walk_expr(&item.context_expr, current);
        if let Some(vars) = &item.optional_vars {
            self.walk_expr(vars, current);
        }
    }

    fn walk_function_def(&mut self, def: &StmtFunctionDef, current: &mut FunctionBuilder) {
        // Decorator expressions are evaluated in the *enclosing* scope, not
        // the function's own body; we record their dotted names onto the
        // new function but do not attribute the decorator call itself to
        // either function's `calls`.
        let decorators = decorator_names(&def.decorator_list);
        for default in parameter_defaults(&def.parameters) {
            self.walk_expr(default, current);
        }

        let qualname = self.current_qualname(def.name.as_str());
        let is_method = self.immediate_parent_is_class();
        let (start_line, end_line) = line_range_of(&def.body, &self.locator);
        let location = Location::new(self.path, start_line, end_line);
        let flags = FunctionFlags {
            is_async: def.is_async,
            is_method,
            has_bare_raise: false,
        };
        let mut builder = FunctionBuilder::new(qualname, location, flags);
        builder.info.decorators = decorators;
        builder.info.docstring = crate::docstring::extract_docstring(&def.body);

        self.scope_stack
            .push((def.name.to_string(), ScopeKind::Function));
        self.walk_stmts(&def.body, &mut builder);
        self.scope_stack.pop();

        self.finished.push(builder.info);
    }

    fn walk_class_def(&mut self, def: &StmtClassDef, current: &mut FunctionBuilder) {
        if let Some(arguments) = &def.arguments {
            for arg in arguments.args.iter() {
                self.walk_expr(arg, current);
            }
            for keyword in arguments.keywords.iter() {
                self.walk_expr(&keyword.value, current);
            }
        }
        self.scope_stack
            .push((def.name.to_string(), ScopeKind::Class));
        self.walk_stmts(&def.body, current);
        self.scope_stack.pop();
    }

    fn walk_raise(&mut self, raise: &StmtRaise, current: &mut FunctionBuilder) {
        let StmtRaise { exc, cause, .. } = raise;
        if let Some(cause) = cause {
            self.walk_expr(cause, current);
        }
        match exc {
            None => {
                // Bare `raise`: re-raises whatever the innermost handler
                // caught.
                current.mark_bare_raise();
                let innermost = current
                    .innermost_handler()
                    .map(|binding| (binding.caught.clone(), binding.is_universal));
                if let Some((caught, is_universal)) = innermost {
                    self.contribute_reraise_set(&caught, is_universal, current);
                }
            }
            Some(expr) => {
                self.walk_expr(expr, current);
                let callee = raise_target_name(expr);
                let reraise = callee.as_deref().and_then(|name| {
                    current
                        .handler_bound_to(name)
                        .map(|binding| (binding.caught.clone(), binding.is_universal))
                });
                match reraise {
                    Some((caught, is_universal)) => {
                        current.mark_bare_raise();
                        self.contribute_reraise_set(&caught, is_universal, current);
                    }
                    None => {
                        if let Some(qualname) = expr_to_dotted(raise_callee(expr)) {
                            current.record_direct_raise(qualname);
                        }
                    }
                }
            }
        }
    }

    /// Re-raise of the innermost handler's own variable or a bare `raise`:
    /// contribute the handler's caught set, not a literal new class (spec
    /// §4.1, testable property 2).
    fn contribute_reraise_set(
        &mut self,
        caught: &[QualName],
        is_universal: bool,
        current: &mut FunctionBuilder,
    ) {
        if is_universal {
            current.record_direct_raise(QualName::new(
                raiseattention_model::EXCEPTION_UNTYPED,
            ));
            return;
        }
        match caught {
            // A single caught class re-raises exactly: Exact confidence is
            // assigned later when the Signature Engine folds direct_raises
            // into an ExceptionSet, not here.
            [only] => current.record_direct_raise(only.clone()),
            // A tuple-form handler (`except (A, B):`) re-raising its own
            // variable approximates to the untyped base rather than
            // enumerating every caught member: precision is sacrificed for
            // a cheap, conservative approximation consistent with how this
            // tool treats bare `except:` handlers.
            _ => current.record_direct_raise(QualName::new(
                raiseattention_model::EXCEPTION_UNTYPED,
            )),
        }
    }

    fn walk_try(&mut self, stmt_try: &StmtTry, current: &mut FunctionBuilder) {
        let StmtTry {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        } = stmt_try;
        let (start_line, end_line) = line_range_of(body, &self.locator);
        let id = current.begin_try();
        self.walk_stmts(body, current);
        current.end_try_body();

        let mut scope = TryScope::new(id, start_line, end_line);
        for handler in handlers {
            let ruff_python_ast::ExceptHandler::ExceptHandler(handler) = handler;
            let except_handler = build_except_handler(handler);
            current.enter_handler(&except_handler);
            self.walk_stmts(&handler.body, current);
            current.exit_handler();
            scope.handlers.push(except_handler);
        }
        current.finish_try(scope);

        self.walk_stmts(orelse, current);
        self.walk_stmts(finalbody, current);
    }

    fn walk_expr(&mut self, expr: &Expr, current: &mut FunctionBuilder) {
        match expr {
            Expr::Call(call) => self.walk_call(call, current, false),
            Expr::Await(ExprAwait { value, .. }) => match value.as_ref() {
                Expr::Call(call) => self.walk_call(call, current, true),
                other => self.walk_expr(other, current),
            },
            Expr::BoolOp(ExprBoolOp { values, .. }) => {
                for value in values {
                    self.walk_expr(value, current);
                }
            }
            Expr::Named(ExprNamed { target, value, .. }) => {
                self.walk_expr(target, current);
                self.walk_expr(value, current);
            }
            Expr::BinOp(ExprBinOp { left, right, .. }) => {
                self.walk_expr(left, current);
                self.walk_expr(right, current);
            }
            Expr::UnaryOp(ExprUnaryOp { operand, .. }) => self.walk_expr(operand, current),
            Expr::Lambda(_) => {
                // Lambda bodies are treated opaquely throughout (spec
                // non-goals: anonymous-function bodies are not analysed).
            }
            Expr::If(ExprIf {
                test, body, orelse, ..
            }) => {
                self.walk_expr(test, current);
                self.walk_expr(body, current);
                self.walk_expr(orelse, current);
            }
            Expr::Dict(ExprDict { items, .. }) => {
                for item in items {
                    if let Some(key) = &item.key {
                        self.walk_expr(key, current);
                    }
                    self.walk_expr(&item.value, current);
                }
            }
            Expr::Set(set) => {
                for elt in &set.elts {
                    self.walk_expr(elt, current);
                }
            }
            Expr::ListComp(ExprListComp {
                elt, generators, ..
            }) => {
                self.walk_expr(elt, current);
                self.walk_comprehensions(generators, current);
            }
            Expr::SetComp(ExprSetComp {
                elt, generators, ..
            }) => {
                self.walk_expr(elt, current);
                self.walk_comprehensions(generators, current);
            }
            Expr::DictComp(ExprDictComp {
                key,
                value,
                generators,
                ..
            }) => {
                self.walk_expr(key, current);
                self.walk_expr(value, current);
                self.walk_comprehensions(generators, current);
            }
            Expr::Generator(ExprGenerator {
                elt, generators, ..
            }) => {
                self.walk_expr(elt, current);
                self.walk_comprehensions(generators, current);
            }
            Expr::Yield(ExprYield { value, .. }) => {
                if let Some(value) = value {
                    self.walk_expr(value, current);
                }
            }
            Expr::YieldFrom(ExprYieldFrom { value, .. }) => self.walk_expr(value, current),
            Expr::Compare(ExprCompare {
                left, comparators, ..
            }) => {
                self.walk_expr(left, current);
                for comparator in comparators {
                    self.walk_expr(comparator, current);
                }
            }
            Expr::FString(ExprFString { value, .. }) => {
                for part in value.iter() {
                    if let ruff_python_ast::FStringPart::FString(fstring) = part {
                        for element in fstring.elements.iter() {
                            if let ruff_python_ast::FStringElement::Expression(expr_element) =
                                element
                            {
                                self.walk_expr(&expr_element.expression, current);
                            }
                        }
                    }
                }
            }
            Expr::Attribute(ExprAttribute { value, .. }) => self.walk_expr(value, current),
            Expr::Subscript(ExprSubscript { value, slice, .. }) => {
                self.walk_expr(value, current);
                self.walk_expr(slice, current);
            }
            Expr::Starred(ExprStarred { value, .. }) => self.walk_expr(value, current),
            Expr::List(list) => {
                for elt in &list.elts {
                    self.walk_expr(elt, current);
                }
            }
            Expr::Tuple(tuple) => {
                for elt in tuple.elts.iter() {
                    self.walk_expr(elt, current);
                }
            }
            Expr::Slice(ExprSlice {
                lower, upper, step, ..
            }) => {
                for part in [lower, upper, step].into_iter().flatten() {
                    self.walk_expr(part, current);
                }
            }
            Expr::Name(_)
            | Expr::StringLiteral(_)
            | Expr::BytesLiteral(_)
            | Expr::NumberLiteral(_)
            | Expr::BooleanLiteral(_)
            | Expr::NoneLiteral(_)
            | Expr::EllipsisLiteral(_)
            | Expr::IpyEscapeCommand(_) => {}
        }
    }

    fn walk_comprehensions(&mut self, generators: &[Comprehension], current: &mut FunctionBuilder) {
        for generator in generators {
            self.walk_expr(&generator.iter, current);
            for condition in &generator.ifs {
                self.walk_expr(condition, current);
            }
        }
    }

    fn walk_call(&mut self, call: &ExprCall, current: &mut FunctionBuilder, is_awaited: bool) {
        let callee = expr_to_dotted(&call.func);
        let position = self.locator.position(call.range().start());
        let mut info = CallInfo::new(callee.clone(), position);
        info.end_line = self.locator.line(call.range().end());
        info.enclosing_try_scopes = current.enclosing_try_scopes();
        info.is_awaited = is_awaited;
        info.callable_hints = callable_hints(&call.arguments, callee.as_ref());
        current.record_call(info);

        self.walk_expr(&call.func, current);
        for arg in call.arguments.args.iter() {
            self.walk_expr(arg, current);
        }
        for keyword in call.arguments.keywords.iter() {
            self.walk_expr(&keyword.value, current);
        }
    }
}

fn callable_hints(
    arguments: &Arguments,
    callee: Option<&QualName>,
) -> Vec<(raiseattention_model::CallableHintSlot, CallableHint)> {
    let mut hints = Vec::new();

    if let Some(callee) = callee {
        if hof::FIRST_POSITIONAL_CALLABLE.contains(&callee.short_name()) {
            if let Some(first) = arguments.args.first() {
                if let Some(hint) = callable_hint_of(first) {
                    hints.push((None, hint));
                }
            }
        }
    }

    for keyword in arguments.keywords.iter() {
        let Some(name) = &keyword.arg else { continue };
        if hof::KEYWORD_HINT_NAMES.contains(&name.as_str()) {
            if let Some(hint) = callable_hint_of(&keyword.value) {
                hints.push((Some(static_keyword_name(name.as_str())), hint));
            }
        }
    }

    hints
}

/// The hint's slot type is `Option<&'static str>`: keyword names come from a
/// small fixed registry, so interning them once here avoids threading
/// lifetimes through `CallInfo`.
fn static_keyword_name(name: &str) -> &'static str {
    hof::KEYWORD_HINT_NAMES
        .iter()
        .find(|candidate| **candidate == name)
        .copied()
        .unwrap_or("")
}

fn callable_hint_of(expr: &Expr) -> Option<CallableHint> {
    if is_lambda(expr) {
        Some(CallableHint::Lambda)
    } else {
        expr_to_dotted(expr).map(CallableHint::Named)
    }
}

fn decorator_names(decorators: &[Decorator]) -> Vec<QualName> {
    decorators
        .iter()
        .filter_map(|decorator| match &decorator.expression {
            Expr::Call(call) => expr_to_dotted(&call.func),
            other => expr_to_dotted(other),
        })
        .collect()
}

fn parameter_defaults(parameters: &Parameters) -> Vec<&Expr> {
    parameters
        .posonlyargs
        .iter()
        .chain(parameters.args.iter())
        .chain(parameters.kwonlyargs.iter())
        .filter_map(|param| param.default.as_deref())
        .collect()
}

fn build_except_handler(
    handler: &ruff_python_ast::ExceptHandlerExceptHandler,
) -> ExceptHandler {
    let as_name = handler.name.as_ref().map(|id| id.to_string());
    match &handler.type_ {
        None => ExceptHandler::universal(),
        Some(expr) => {
            let caught = match expr.as_ref() {
                Expr::Tuple(tuple) => tuple
                    .elts
                    .iter()
                    .filter_map(expr_to_dotted)
                    .collect::<Vec<_>>(),
                other => expr_to_dotted(other).into_iter().collect(),
            };
            ExceptHandler::typed(caught, as_name)
        }
    }
}

/// The bare-name target of a `raise name` / `raise name(...)` expression,
/// used to check whether it matches an enclosing handler's `as` binding. A
/// call expression's callee is checked, not the call itself, since
/// `raise SomeError("msg")` still re-raises-by-name only when `SomeError`
/// itself is the handler's bound variable (rare but technically legal TL,
/// since the bound variable is just an instance -- calling it would be a
/// `TypeError` at runtime, so this arm is mostly defensive).
fn raise_target_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.id.to_string()),
        Expr::Call(call) => match call.func.as_ref() {
            Expr::Name(name) => Some(name.id.to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn raise_callee(expr: &Expr) -> &Expr {
    match expr {
        Expr::Call(call) => &call.func,
        other => other,
    }
}

fn line_range_of(stmts: &[Stmt], locator: &Locator<'_>) -> (u32, u32) {
    match (stmts.first(), stmts.last()) {
        (Some(first), Some(last)) => (
            locator.line(first.range().start()),
            locator.line(last.range().end()),
        ),
        _ => (0, 0),
    }
}
