use crate::hierarchy::is_ancestor_or_self;
use crate::{QualName, TryScope, TryScopeId};

/// The union of everything caught by a call site's enclosing try/except
/// handlers, expanded by the built-in exception hierarchy. Built once per
/// call site and reused by both the Signature Engine (subtracting it from a
/// propagated callee signature) and the Diagnostic Engine (computing
/// `unhandled(c)`).
#[derive(Debug, Clone, Default)]
pub struct HandledSet {
    /// Every class name caught by any enclosing handler, unioned across
    /// every enclosing `TryScope`.
    caught: Vec<QualName>,
    /// `true` if any enclosing handler is a bare `except:` (equivalent to
    /// catching `BaseException`).
    universal: bool,
}

impl HandledSet {
    /// Builds the handled set for a call site whose innermost-last
    /// enclosing try-scope ids are `enclosing`, given the full list of
    /// `TryScope`s declared in the containing function. Every id in
    /// `enclosing` is expected to index into `scopes`.
    #[must_use]
    pub fn from_enclosing(scopes: &[TryScope], enclosing: &[TryScopeId]) -> Self {
        let mut caught = Vec::new();
        let mut universal = false;
        for id in enclosing {
            let Some(scope) = scopes.iter().find(|scope| scope.id == *id) else {
                continue;
            };
            for handler in &scope.handlers {
                if handler.is_universal {
                    universal = true;
                }
                caught.extend(handler.caught.iter().cloned());
            }
        }
        Self { caught, universal }
    }

    /// Returns `true` if this handled set covers `raised_short_name`: an
    /// exact match by rightmost segment, or a descendant of a caught class
    /// in the built-in hierarchy, or any handler was a bare `except:`.
    #[must_use]
    pub fn covers(&self, raised_short_name: &str) -> bool {
        self.universal
            || self
                .caught
                .iter()
                .any(|class| is_ancestor_or_self(class.short_name(), raised_short_name))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.universal && self.caught.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExceptHandler, TryScope, TryScopeId};

    fn scope_with(id: u32, handlers: Vec<ExceptHandler>) -> TryScope {
        let mut scope = TryScope::new(TryScopeId(id), 1, 10);
        scope.handlers = handlers;
        scope
    }

    #[test]
    fn union_across_multiple_enclosing_scopes() {
        let scopes = vec![
            scope_with(
                0,
                vec![ExceptHandler::typed(vec![QualName::new("ValueError")], None)],
            ),
            scope_with(
                1,
                vec![ExceptHandler::typed(vec![QualName::new("KeyError")], None)],
            ),
        ];
        let handled = HandledSet::from_enclosing(&scopes, &[TryScopeId(0), TryScopeId(1)]);
        assert!(handled.covers("ValueError"));
        assert!(handled.covers("KeyError"));
        assert!(!handled.covers("TypeError"));
    }

    #[test]
    fn hierarchy_expansion_covers_descendants() {
        let scopes = vec![scope_with(
            0,
            vec![ExceptHandler::typed(vec![QualName::new("OSError")], None)],
        )];
        let handled = HandledSet::from_enclosing(&scopes, &[TryScopeId(0)]);
        assert!(handled.covers("FileNotFoundError"));
    }

    #[test]
    fn universal_handler_covers_everything() {
        let scopes = vec![scope_with(0, vec![ExceptHandler::universal()])];
        let handled = HandledSet::from_enclosing(&scopes, &[TryScopeId(0)]);
        assert!(handled.covers("AnythingAtAll"));
    }

    #[test]
    fn no_enclosing_scopes_handles_nothing() {
        let handled = HandledSet::from_enclosing(&[], &[]);
        assert!(handled.is_empty());
        assert!(!handled.covers("ValueError"));
    }
}
