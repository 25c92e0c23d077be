use std::sync::OnceLock;

use regex::Regex;

/// An inline-ignore comment found on a call's physical line(s), in the form
/// `# raiseattention: ignore[ExceptionName, ...]` (or the `ra:` shorthand).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum IgnoreDirective {
    /// `ignore[A, B, ...]`: remove exactly these exceptions (matched by
    /// short name) from the call site's diagnostic.
    List(Vec<String>),
    /// A bare `ignore` with no bracketed list: invalid, produces a warning
    /// diagnostic of its own, suppresses nothing.
    BareInvalid,
}

fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:raiseattention|ra)\s*:\s*ignore(?:\s*\[\s*([A-Za-z_][A-Za-z0-9_]*(?:\s*,\s*[A-Za-z_][A-Za-z0-9_]*)*)\s*\])?",
        )
        .expect("inline-ignore pattern is a valid regex")
    })
}

/// Scans `lines` (the call's starting physical line, then any continuation
/// lines up to the trailing line of a multi-line call expression) for the
/// first inline-ignore comment, in order.
#[must_use]
pub fn find_directive(lines: &[&str]) -> Option<IgnoreDirective> {
    for line in lines {
        if let Some(captures) = pattern().captures(line) {
            return Some(match captures.get(1) {
                Some(list) => IgnoreDirective::List(
                    list.as_str()
                        .split(',')
                        .map(|name| name.trim().to_string())
                        .collect(),
                ),
                None => IgnoreDirective::BareInvalid,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_raiseattention_prefix() {
        let directive = find_directive(&["r()  # raiseattention: ignore[ValueError]"]);
        assert_eq!(directive, Some(IgnoreDirective::List(vec!["ValueError".to_string()])));
    }

    #[test]
    fn recognises_short_ra_prefix_case_insensitively() {
        let directive = find_directive(&["r()  # RA: ignore[ValueError, KeyError]"]);
        assert_eq!(
            directive,
            Some(IgnoreDirective::List(vec!["ValueError".to_string(), "KeyError".to_string()]))
        );
    }

    #[test]
    fn bare_ignore_with_no_list_is_invalid() {
        let directive = find_directive(&["r()  # ra: ignore"]);
        assert_eq!(directive, Some(IgnoreDirective::BareInvalid));
    }

    #[test]
    fn no_comment_at_all_is_none() {
        assert_eq!(find_directive(&["r()"]), None);
    }

    #[test]
    fn checks_every_line_in_a_multi_line_call() {
        let directive = find_directive(&["r(", "    a, b,", ")  # ra: ignore[ValueError]"]);
        assert_eq!(directive, Some(IgnoreDirective::List(vec!["ValueError".to_string()])));
    }
}
