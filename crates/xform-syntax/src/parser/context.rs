//! Per-call match state.

use std::{iter, ptr};

use crate::rule::Patterns;

/// Cursor state threaded through one match call.
///
/// Contexts are copied, never mutated: each recursive step derives its own.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'c> {
    /// Exclusive token index the current element must end at.
    pub(crate) end: usize,
    /// Rule whose body is being matched.
    pub(crate) rule: &'c str,
    /// Innermost left-recursion fence.
    pub(crate) guard: Option<&'c Guard<'c>>,
}

impl<'c> Context<'c> {
    pub(crate) fn new(end: usize, rule: &'c str) -> Self {
        Self {
            end,
            rule,
            guard: None,
        }
    }

    /// Same rule and guards, another cursor.
    pub(crate) fn at(self, end: usize) -> Self {
        Self { end, ..self }
    }

    /// Same cursor and guards, inside another rule.
    pub(crate) fn enter(self, rule: &'c str) -> Self {
        Self { rule, ..self }
    }

    /// Same rule, at `guard`'s cursor and behind it.
    pub(crate) fn fenced(self, guard: &'c Guard<'c>) -> Self {
        Self {
            end: guard.end,
            rule: self.rule,
            guard: Some(guard),
        }
    }

    /// Returns true if `group` of the current rule may not run at the
    /// current cursor.
    pub(crate) fn is_fenced(&self, group: &Patterns) -> bool {
        iter::successors(self.guard, |guard| guard.parent)
            .any(|guard| guard.fences(self.rule, self.end, group))
    }

    /// Identifies the fence chain; `0` outside every anchor.
    pub(crate) fn scope(&self) -> usize {
        self.guard.map_or(0, |guard| guard.id)
    }
}

/// Fences one left-recursive group of a rule at one cursor while that
/// group's anchor is matched there.
#[derive(Debug)]
pub(crate) struct Guard<'c> {
    /// Unique within one parse call, never `0`.
    pub(crate) id: usize,
    pub(crate) rule: &'c str,
    pub(crate) end: usize,
    pub(crate) group: &'c Patterns,
    pub(crate) parent: Option<&'c Guard<'c>>,
}

impl Guard<'_> {
    fn fences(&self, rule: &str, end: usize, group: &Patterns) -> bool {
        self.end == end && self.rule == rule && ptr::eq(self.group, group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Pattern, PatternEntry};

    fn group(terminal: &str) -> Patterns {
        Patterns::and([
            PatternEntry::from(Pattern::symbol("relay")),
            Pattern::equals(terminal).into(),
        ])
    }

    #[test]
    fn fence_matches_rule_cursor_and_group() {
        let member = group(".");
        let call = group("(");
        let outer = Guard {
            id: 1,
            rule: "relay",
            end: 4,
            group: &member,
            parent: None,
        };
        let inner = Guard {
            id: 2,
            rule: "invoke",
            end: 2,
            group: &call,
            parent: Some(&outer),
        };
        let ctx = Context {
            end: 4,
            rule: "relay",
            guard: Some(&inner),
        };

        assert!(ctx.is_fenced(&member));
        assert!(!ctx.is_fenced(&call));
        assert!(!ctx.at(3).is_fenced(&member));
        assert!(!ctx.enter("invoke").is_fenced(&member));
        assert!(ctx.at(2).enter("invoke").is_fenced(&call));
        assert!(!Context::new(4, "relay").is_fenced(&member));
    }

    #[test]
    fn scope_follows_innermost_guard() {
        let member = group(".");
        let guard = Guard {
            id: 7,
            rule: "relay",
            end: 3,
            group: &member,
            parent: None,
        };
        let ctx = Context::new(5, "relay");
        assert_eq!(ctx.scope(), 0);

        let fenced = ctx.fenced(&guard);
        assert_eq!(fenced.scope(), 7);
        assert_eq!(fenced.end, 3);
        assert!(fenced.is_fenced(&member));
    }
}
