use ruff_python_ast::{Expr, Stmt};

/// Extract the docstring from a function/class/module body: the literal
/// string value of the first statement, if that statement is a bare string
/// expression.
pub fn extract_docstring(body: &[Stmt]) -> Option<String> {
    let first = body.first()?;
    let Stmt::Expr(stmt_expr) = first else {
        return None;
    };
    match stmt_expr.value.as_ref() {
        Expr::StringLiteral(literal) => Some(literal.value.to_str().to_owned()),
        _ => None,
    }
}
