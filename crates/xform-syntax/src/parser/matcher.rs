//! Back-to-front matching engine.
//!
//! Every match function receives the exclusive index its element must end at
//! and returns how many tokens it consumed walking backwards from there. A
//! sequence matches its last entry first, each earlier entry ending where the
//! later one began.
//!
//! Rule results are memoized for the duration of one call, keyed by rule,
//! cursor and fence scope, so backtracking never re-derives a rule at a
//! cursor it has already visited.

use std::cell::{Cell, RefCell};

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{trace, warn};

use super::context::{Context, Guard};
use crate::ast::Ast;
use crate::lexer::Token;
use crate::rule::{Operator, Pattern, PatternEntry, Patterns, Repeat, Rules, Terminal, Unwrap};

/// A successful match: tokens consumed and the nodes it contributes to its
/// parent, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Step {
    pub(crate) steps: usize,
    pub(crate) children: Vec<Ast>,
}

impl Step {
    fn new(steps: usize, children: Vec<Ast>) -> Self {
        Self { steps, children }
    }
}

/// `(rule index, cursor, fence scope)`
type MemoKey = (usize, usize, usize);

/// State of one parse call over a fixed token stream.
pub(crate) struct Matcher<'m> {
    rules: &'m Rules,
    tokens: &'m [Token],
    /// Most tokens consumed from the end by any successful terminal.
    furthest: Cell<usize>,
    /// First undefined rule referenced during matching.
    missing: RefCell<Option<SmolStr>>,
    memo: RefCell<FxHashMap<MemoKey, Option<(usize, Ast)>>>,
    /// Last fence id handed out.
    guards: Cell<usize>,
}

impl<'m> Matcher<'m> {
    pub(crate) fn new(rules: &'m Rules, tokens: &'m [Token]) -> Self {
        Self {
            rules,
            tokens,
            furthest: Cell::new(0),
            missing: RefCell::new(None),
            memo: RefCell::new(FxHashMap::default()),
            guards: Cell::new(0),
        }
    }

    pub(crate) fn furthest(&self) -> usize {
        self.furthest.get()
    }

    pub(crate) fn take_missing(&self) -> Option<SmolStr> {
        self.missing.borrow_mut().take()
    }

    /// Matches rule `name` ending at `ctx.end` and returns its node before
    /// the rule's unwrap directive is applied.
    pub(crate) fn match_rule<'c>(&'c self, name: &str, ctx: Context<'c>) -> Option<(usize, Ast)> {
        let Some((index, rule, entry)) = self.rules.get_full(name) else {
            let mut missing = self.missing.borrow_mut();
            if missing.is_none() {
                warn!("reference to undefined rule '{}'", name);
                *missing = Some(SmolStr::new(name));
            }
            return None;
        };

        let key = (index, ctx.end, ctx.scope());
        if let Some(known) = self.memo.borrow().get(&key) {
            return known.clone();
        }

        let ctx = ctx.enter(rule.as_str());
        let matched = match entry {
            PatternEntry::Pattern(Pattern::Terminal(terminal)) => self
                .match_terminal(terminal, ctx)
                .map(|token| (1, Ast::leaf(rule.clone(), token.clone()))),
            entry => self
                .match_entry(entry, ctx)
                .map(|step| (step.steps, Ast::tree(rule.clone(), step.children))),
        };
        self.memo.borrow_mut().insert(key, matched.clone());
        matched
    }

    /// Applies the unwrap directive of the node's rule as the node enters
    /// `caller`.
    ///
    /// An Always rule's own leaves are renamed to `caller` when it is
    /// spliced, so its name does not outlive the splice.
    pub(crate) fn unwrap_node(&self, node: Ast, caller: &str) -> Vec<Ast> {
        match self.rules.unwrap_of(node.name()) {
            Unwrap::Always => {
                let name = SmolStr::new(node.name());
                let spliced = match node {
                    Ast::Leaf(_) => vec![node],
                    Ast::Tree(_) => node.into_children(),
                };
                spliced
                    .into_iter()
                    .map(|child| {
                        if child.token().is_some() && child.name() == name.as_str() {
                            child.renamed(caller)
                        } else {
                            child
                        }
                    })
                    .collect()
            }
            Unwrap::OneTime if node.children().len() == 1 => node.into_children(),
            _ => vec![node],
        }
    }

    fn match_entry<'c>(&'c self, entry: &'c PatternEntry, ctx: Context<'c>) -> Option<Step> {
        match entry {
            PatternEntry::Pattern(Pattern::Terminal(terminal)) => {
                let token = self.match_terminal(terminal, ctx)?;
                Some(Step::new(1, vec![Ast::leaf(ctx.rule, token.clone())]))
            }
            PatternEntry::Pattern(Pattern::Symbol(name)) => {
                let (steps, node) = self.match_rule(name, ctx)?;
                Some(Step::new(steps, self.unwrap_node(node, ctx.rule)))
            }
            PatternEntry::Patterns(group) => match group.repeat() {
                Repeat::NoRepeat => self.match_once(group, ctx),
                repeat => self.match_repeat(group, repeat, ctx),
            },
        }
    }

    fn match_terminal(&self, terminal: &Terminal, ctx: Context<'_>) -> Option<&'m Token> {
        let index = ctx.end.checked_sub(1)?;
        let token = self.tokens.get(index)?;
        if !self.rules.is_match(terminal, token.text()) {
            return None;
        }

        let consumed = self.tokens.len() - index;
        if consumed > self.furthest.get() {
            self.furthest.set(consumed);
        }
        Some(token)
    }

    /// Matches a group once, ignoring its repeat mode.
    fn match_once<'c>(&'c self, group: &'c Patterns, ctx: Context<'c>) -> Option<Step> {
        match group.operator() {
            Operator::Or => group
                .entries()
                .iter()
                .find_map(|entry| self.match_entry(entry, ctx)),
            Operator::And if self.rules.is_left_recursive(group, ctx.rule) => {
                self.match_left_recursive(group, ctx)
            }
            Operator::And => self.match_sequence(group.entries(), ctx),
        }
    }

    /// Matches a sequence, last entry first.
    ///
    /// A repeated entry offers every iteration count from the greedy one
    /// down to its minimum, so the entries before it can reclaim tokens it
    /// would otherwise swallow.
    fn match_sequence<'c>(&'c self, entries: &'c [PatternEntry], ctx: Context<'c>) -> Option<Step> {
        let Some((last, rest)) = entries.split_last() else {
            return Some(Step::default());
        };

        match last {
            PatternEntry::Patterns(group) if group.repeat() != Repeat::NoRepeat => {
                let repeat = group.repeat();
                let iterations = self.repeat_iterations(group, repeat, ctx);
                (0..=iterations.len()).rev().find_map(|count| {
                    let step = collect_iterations(&iterations[..count], repeat)?;
                    self.prepend(rest, ctx, step)
                })
            }
            entry => {
                let step = self.match_entry(entry, ctx)?;
                self.prepend(rest, ctx, step)
            }
        }
    }

    fn prepend<'c>(&'c self, entries: &'c [PatternEntry], ctx: Context<'c>, step: Step) -> Option<Step> {
        let mut head = self.match_sequence(entries, ctx.at(ctx.end - step.steps))?;
        head.steps += step.steps;
        head.children.extend(step.children);
        Some(head)
    }

    fn match_repeat<'c>(&'c self, group: &'c Patterns, repeat: Repeat, ctx: Context<'c>) -> Option<Step> {
        let iterations = self.repeat_iterations(group, repeat, ctx);
        collect_iterations(&iterations, repeat)
    }

    /// Matches `group` greedily at successively earlier cursors. Iterations
    /// are returned rightmost first.
    fn repeat_iterations<'c>(&'c self, group: &'c Patterns, repeat: Repeat, ctx: Context<'c>) -> Vec<Step> {
        let mut steps = 0;
        let mut iterations = Vec::new();
        loop {
            let end = ctx.end - steps;
            if end == 0 && !iterations.is_empty() {
                break;
            }
            let Some(step) = self.match_once(group, ctx.at(end)) else {
                break;
            };
            if step.steps == 0 {
                // An empty iteration would repeat forever at this cursor.
                if iterations.is_empty() {
                    iterations.push(step);
                }
                break;
            }
            steps += step.steps;
            iterations.push(step);
            if repeat.at_most_once() {
                break;
            }
        }
        iterations
    }

    fn next_guard_id(&self) -> usize {
        let id = self.guards.get() + 1;
        self.guards.set(id);
        id
    }

    /// Matches `[first, tail..]` where `first` leads back into the current
    /// rule.
    ///
    /// The tail is matched repeatedly from the cursor backwards, then `first`
    /// is matched once before the leftmost tail with this group fenced at
    /// that cursor. If that anchor fails, the leftmost tail is given back to
    /// it. Tails are then folded left to right, each previous result becoming
    /// the leading child of a new node of the rule.
    fn match_left_recursive<'c>(&'c self, group: &'c Patterns, ctx: Context<'c>) -> Option<Step> {
        if ctx.is_fenced(group) {
            return None;
        }
        let (first, tail) = group.entries().split_first()?;

        let mut tails: Vec<(usize, Step)> = Vec::new();
        let mut pos = ctx.end;
        while pos > 0 {
            let Some(step) = self.match_sequence(tail, ctx.at(pos)) else {
                break;
            };
            if step.steps == 0 {
                break;
            }
            pos -= step.steps;
            tails.push((pos, step));
        }

        while let Some(&(anchor_end, _)) = tails.last() {
            let guard = Guard {
                id: self.next_guard_id(),
                rule: ctx.rule,
                end: anchor_end,
                group,
                parent: ctx.guard,
            };
            if let Some(anchor) = self.match_entry(first, ctx.fenced(&guard)) {
                trace!(
                    "left recursion rule={} anchor={}..{} tails={}",
                    ctx.rule,
                    anchor_end - anchor.steps,
                    anchor_end,
                    tails.len()
                );
                return Some(self.extend(ctx, anchor_end, anchor, tails));
            }
            trace!("left recursion rule={} anchor failed at {}", ctx.rule, anchor_end);
            tails.pop();
        }

        None
    }

    fn extend(
        &self,
        ctx: Context<'_>,
        anchor_end: usize,
        anchor: Step,
        tails: Vec<(usize, Step)>,
    ) -> Step {
        let steps = ctx.end - anchor_end + anchor.steps;
        let mut children = anchor.children;
        for (index, (_, tail)) in tails.into_iter().rev().enumerate() {
            if index > 0 {
                children = self.unwrap_node(Ast::tree(ctx.rule, children), ctx.rule);
            }
            children.extend(tail.children);
        }
        Step::new(steps, children)
    }
}

/// Joins repeat iterations (rightmost first) into one result, applying the
/// zero-match policy of `repeat` when there are none.
fn collect_iterations(iterations: &[Step], repeat: Repeat) -> Option<Step> {
    if iterations.is_empty() {
        return match repeat {
            Repeat::OneOrMore => None,
            Repeat::ZeroOrEmpty => Some(Step::new(0, vec![Ast::empty()])),
            _ => Some(Step::default()),
        };
    }

    let steps = iterations.iter().map(|step| step.steps).sum();
    let children = iterations
        .iter()
        .rev()
        .flat_map(|step| step.children.iter().cloned())
        .collect();
    Some(Step::new(steps, children))
}
