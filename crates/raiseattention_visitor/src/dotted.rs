use ruff_python_ast::Expr;

use raiseattention_model::QualName;

/// Render `expr` as a dotted string if it is a `Name` or a chain of
/// `Attribute` accesses rooted at a `Name` (e.g. `os.path.join`). Anything
/// else (a call result, a subscript, a literal, ...) is not syntactically
/// resolvable and returns `None`: callable-argument hints are only emitted
/// when the argument expression is a name or dotted attribute.
pub fn expr_to_dotted(expr: &Expr) -> Option<QualName> {
    expr_to_segments(expr).map(|segments| QualName::new(segments.join(".")))
}

fn expr_to_segments(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Name(name) => Some(vec![name.id.to_string()]),
        Expr::Attribute(attribute) => {
            let mut segments = expr_to_segments(&attribute.value)?;
            segments.push(attribute.attr.to_string());
            Some(segments)
        }
        _ => None,
    }
}

/// Returns `true` if `expr` is a lambda expression -- the one case where a
/// callable argument is recorded (as the `«lambda»` sentinel) even though it
/// is not a dotted name.
pub fn is_lambda(expr: &Expr) -> bool {
    matches!(expr, Expr::Lambda(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruff_python_parser::parse_expression;

    fn parse(src: &str) -> ruff_python_ast::Expr {
        parse_expression(src)
            .expect("valid expression")
            .into_syntax()
            .body
            .as_ref()
            .clone()
    }

    #[test]
    fn resolves_plain_name() {
        assert_eq!(expr_to_dotted(&parse("risky")).unwrap().as_str(), "risky");
    }

    #[test]
    fn resolves_dotted_attribute_chain() {
        assert_eq!(
            expr_to_dotted(&parse("os.path.join")).unwrap().as_str(),
            "os.path.join"
        );
    }

    #[test]
    fn call_result_is_not_resolvable() {
        assert!(expr_to_dotted(&parse("make_callback()")).is_none());
    }

    #[test]
    fn subscript_is_not_resolvable() {
        assert!(expr_to_dotted(&parse("callbacks[0]")).is_none());
    }

    #[test]
    fn lambda_is_detected_separately() {
        let expr = parse("lambda x: x.bad");
        assert!(is_lambda(&expr));
        assert!(expr_to_dotted(&expr).is_none());
    }
}
