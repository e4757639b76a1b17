//! Static recursion-shape analysis.
//!
//! The matcher walks tokens back to front, so a rule may only re-enter
//! itself after the cursor has moved. Two relations are derived here:
//!
//! - the *left edge* of a rule: rules reachable through leftmost positions.
//!   A sequence whose first element is a symbol with the enclosing rule in
//!   its left edge is handled by the left-recursion procedure.
//! - the *same-cursor* edges: rules entered without consuming a token first
//!   (the last element of a sequence, every alternative, a repeated body).
//!   A cycle in this graph would never terminate and is rejected.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::{GrammarError, Operator, Pattern, PatternEntry, Patterns};

#[derive(Debug, Clone, Default)]
pub(super) struct Analysis {
    nullable: FxHashSet<SmolStr>,
    left_edges: FxHashMap<SmolStr, FxHashSet<SmolStr>>,
}

impl Analysis {
    pub(super) fn new(rules: &IndexMap<SmolStr, PatternEntry>) -> Self {
        let mut analysis = Self {
            nullable: nullable_rules(rules),
            left_edges: FxHashMap::default(),
        };

        let direct: FxHashMap<SmolStr, FxHashSet<SmolStr>> = rules
            .iter()
            .map(|(name, entry)| {
                let mut edges = FxHashSet::default();
                analysis.collect_left(entry, &mut edges);
                (name.clone(), edges)
            })
            .collect();
        analysis.left_edges = transitive_closure(&direct);
        analysis
    }

    fn is_nullable(&self, entry: &PatternEntry) -> bool {
        entry_nullable(entry, &self.nullable)
    }

    fn collect_left(&self, entry: &PatternEntry, out: &mut FxHashSet<SmolStr>) {
        match entry {
            PatternEntry::Pattern(Pattern::Terminal(_)) => {}
            PatternEntry::Pattern(Pattern::Symbol(name)) => {
                out.insert(name.clone());
            }
            PatternEntry::Patterns(group) => match group.operator() {
                Operator::Or => {
                    for entry in group.entries() {
                        self.collect_left(entry, out);
                    }
                }
                Operator::And => {
                    for entry in group.entries() {
                        self.collect_left(entry, out);
                        if !self.is_nullable(entry) {
                            break;
                        }
                    }
                }
            },
        }
    }

    fn collect_same_cursor(&self, entry: &PatternEntry, rule: &str, out: &mut FxHashSet<SmolStr>) {
        match entry {
            PatternEntry::Pattern(Pattern::Terminal(_)) => {}
            PatternEntry::Pattern(Pattern::Symbol(name)) => {
                out.insert(name.clone());
            }
            PatternEntry::Patterns(group) => match group.operator() {
                Operator::Or => {
                    for entry in group.entries() {
                        self.collect_same_cursor(entry, rule, out);
                    }
                }
                Operator::And => {
                    // The leading element of a left-recursive sequence only
                    // runs once a tail has consumed input.
                    let skip = usize::from(self.is_left_recursive(group, rule));
                    for entry in group.entries()[skip..].iter().rev() {
                        self.collect_same_cursor(entry, rule, out);
                        if !self.is_nullable(entry) {
                            break;
                        }
                    }
                }
            },
        }
    }

    /// Returns true if `from` is `to` or reaches it through leftmost positions.
    pub(super) fn left_reaches(&self, from: &str, to: &str) -> bool {
        from == to
            || self
                .left_edges
                .get(from)
                .is_some_and(|edges| edges.contains(to))
    }

    pub(super) fn is_left_recursive(&self, group: &Patterns, rule: &str) -> bool {
        if group.operator() != Operator::And || group.len() < 2 {
            return false;
        }
        match group.entries().first() {
            Some(PatternEntry::Pattern(Pattern::Symbol(first))) => self.left_reaches(first, rule),
            _ => false,
        }
    }

    /// Rejects grammars with a same-cursor cycle.
    pub(super) fn check_recursion(
        &self,
        rules: &IndexMap<SmolStr, PatternEntry>,
    ) -> Result<(), GrammarError> {
        let graph: FxHashMap<&str, Vec<SmolStr>> = rules
            .iter()
            .map(|(name, entry)| {
                let mut edges = FxHashSet::default();
                self.collect_same_cursor(entry, name, &mut edges);
                let mut edges: Vec<SmolStr> = edges
                    .into_iter()
                    .filter(|edge| rules.contains_key(edge))
                    .collect();
                edges.sort();
                (name.as_str(), edges)
            })
            .collect();

        let mut marks: FxHashMap<&str, Mark> = FxHashMap::default();
        for name in rules.keys() {
            if let Some(rule) = find_cycle(name, &graph, &mut marks) {
                return Err(GrammarError::UnsupportedRecursion { rule });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn find_cycle<'a>(
    name: &'a str,
    graph: &'a FxHashMap<&'a str, Vec<SmolStr>>,
    marks: &mut FxHashMap<&'a str, Mark>,
) -> Option<SmolStr> {
    match marks.get(name) {
        Some(Mark::Done) => return None,
        Some(Mark::Visiting) => return Some(SmolStr::new(name)),
        None => {}
    }

    marks.insert(name, Mark::Visiting);
    for next in graph.get(name).into_iter().flatten() {
        if let Some(rule) = find_cycle(next.as_str(), graph, marks) {
            return Some(rule);
        }
    }
    marks.insert(name, Mark::Done);
    None
}

fn entry_nullable(entry: &PatternEntry, nullable: &FxHashSet<SmolStr>) -> bool {
    match entry {
        PatternEntry::Pattern(Pattern::Terminal(_)) => false,
        PatternEntry::Pattern(Pattern::Symbol(name)) => nullable.contains(name),
        PatternEntry::Patterns(group) => {
            if group.repeat().allows_zero() {
                return true;
            }
            match group.operator() {
                Operator::And => group
                    .entries()
                    .iter()
                    .all(|entry| entry_nullable(entry, nullable)),
                Operator::Or => group
                    .entries()
                    .iter()
                    .any(|entry| entry_nullable(entry, nullable)),
            }
        }
    }
}

fn nullable_rules(rules: &IndexMap<SmolStr, PatternEntry>) -> FxHashSet<SmolStr> {
    let mut nullable = FxHashSet::default();
    loop {
        let before = nullable.len();
        for (name, entry) in rules {
            if !nullable.contains(name) && entry_nullable(entry, &nullable) {
                nullable.insert(name.clone());
            }
        }
        if nullable.len() == before {
            return nullable;
        }
    }
}

fn transitive_closure(
    direct: &FxHashMap<SmolStr, FxHashSet<SmolStr>>,
) -> FxHashMap<SmolStr, FxHashSet<SmolStr>> {
    direct
        .keys()
        .map(|name| {
            let mut reached: FxHashSet<SmolStr> = FxHashSet::default();
            let mut pending: Vec<&SmolStr> = direct[name].iter().collect();
            while let Some(next) = pending.pop() {
                if reached.insert(next.clone()) {
                    if let Some(edges) = direct.get(next) {
                        pending.extend(edges.iter());
                    }
                }
            }
            (name.clone(), reached)
        })
        .collect()
}
