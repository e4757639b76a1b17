//! Grammar model.
//!
//! A grammar is a [`Rules`] map from rule names to [`PatternEntry`] values.
//! An entry is either a single [`Pattern`] (a terminal compared against one
//! token, or a reference to another rule) or a [`Patterns`] group combining
//! entries with an [`Operator`] and a [`Repeat`] mode.
//!
//! Rule names may carry a prefix marker selecting the rule's [`Unwrap`]
//! directive: `?name` collapses a single-child node into its child, `*name`
//! always splices the node's children into its parent.
//!
//! # Example
//!
//! ```
//! use xform_syntax::rule::{Pattern, PatternEntry, Patterns, Repeat, Rules, Unwrap};
//!
//! let rules = Rules::new([
//!     ("list", PatternEntry::from(Patterns::and([
//!         Pattern::symbol("item").into(),
//!         Patterns::and([Pattern::equals(",").into(), Pattern::symbol("item").into()])
//!             .repeated(Repeat::ZeroOrMore)
//!             .into(),
//!     ]))),
//!     ("?item", Pattern::regexp("[a-z]+").into()),
//! ])
//! .unwrap();
//!
//! assert_eq!(rules.keys().collect::<Vec<_>>(), vec!["list", "item"]);
//! assert_eq!(rules.unwrap_of("item"), Unwrap::OneTime);
//! ```

mod analysis;
mod render;

use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

use crate::parser::ParseError;
use analysis::Analysis;

/// Error raised while building or loading a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A regex terminal does not compile.
    #[error("invalid regex /{expression}/: {message}")]
    InvalidRegex {
        /// The regex source, without delimiters.
        expression: SmolStr,
        /// The compiler's message.
        message: String,
    },
    /// A terminal expression is not delimited by `"..."` or `/.../`.
    #[error("terminal {expression:?} must be delimited by quotes or slashes")]
    InvalidTerminal {
        /// The rejected expression.
        expression: SmolStr,
    },
    /// A rule can re-enter itself without consuming a token.
    #[error("rule '{rule}' recurses without consuming input")]
    UnsupportedRecursion {
        /// A rule on the offending cycle.
        rule: SmolStr,
    },
    /// A grammar tree does not have the bootstrap grammar's shape.
    #[error("malformed grammar tree at '{node}': {reason}")]
    MalformedTree {
        /// Name of the offending node.
        node: SmolStr,
        /// What was expected.
        reason: String,
    },
    /// Grammar text failed to parse.
    #[error("grammar text does not parse: {0}")]
    Syntax(#[from] ParseError),
}

/// How a terminal compares against a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Token text equals the literal.
    Equals,
    /// Token text fully matches the regex.
    Regexp,
}

/// A terminal: one token compared by literal or regex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Terminal {
    comparison: Comparison,
    /// Delimited expression, `"..."` or `/.../`.
    expression: SmolStr,
}

impl Terminal {
    /// Parses a delimited expression. `"..."` compares by equality, `/.../`
    /// by full regex match.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::InvalidTerminal`] for any other shape.
    pub fn parse(expression: &str) -> Result<Self, GrammarError> {
        let delimited = |delimiter: char| {
            expression.len() >= 2
                && expression.starts_with(delimiter)
                && expression.ends_with(delimiter)
        };
        let comparison = if delimited('"') {
            Comparison::Equals
        } else if delimited('/') {
            Comparison::Regexp
        } else {
            return Err(GrammarError::InvalidTerminal {
                expression: expression.into(),
            });
        };

        Ok(Self {
            comparison,
            expression: expression.into(),
        })
    }

    /// Creates a literal terminal.
    #[must_use]
    pub fn equals(value: &str) -> Self {
        Self {
            comparison: Comparison::Equals,
            expression: SmolStr::from(format!("\"{value}\"")),
        }
    }

    /// Creates a full-match regex terminal.
    #[must_use]
    pub fn regexp(value: &str) -> Self {
        Self {
            comparison: Comparison::Regexp,
            expression: SmolStr::from(format!("/{value}/")),
        }
    }

    /// Returns the comparison mode.
    #[must_use]
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Returns the delimited expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the expression without its delimiters.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.expression[1..self.expression.len() - 1]
    }
}

/// A leaf match unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Compares one token.
    Terminal(Terminal),
    /// Defers to the named rule at the same cursor.
    Symbol(SmolStr),
}

impl Pattern {
    /// Creates a reference to another rule.
    #[must_use]
    pub fn symbol(name: impl Into<SmolStr>) -> Self {
        Self::Symbol(name.into())
    }

    /// Creates a literal terminal.
    #[must_use]
    pub fn equals(value: &str) -> Self {
        Self::Terminal(Terminal::equals(value))
    }

    /// Creates a full-match regex terminal.
    #[must_use]
    pub fn regexp(value: &str) -> Self {
        Self::Terminal(Terminal::regexp(value))
    }

    /// Parses a delimited terminal expression.
    ///
    /// # Errors
    ///
    /// See [`Terminal::parse`].
    pub fn terminal(expression: &str) -> Result<Self, GrammarError> {
        Terminal::parse(expression).map(Self::Terminal)
    }
}

/// How the entries of a group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// Every entry matches in sequence.
    #[default]
    And,
    /// The first matching entry wins.
    Or,
}

/// How many times a group matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Repeat {
    /// Exactly once.
    #[default]
    NoRepeat,
    /// `(...)*`
    ZeroOrMore,
    /// `(...)+`
    OneOrMore,
    /// `(...)?`
    ZeroOrOne,
    /// `[...]`: like `ZeroOrOne`, but a miss yields the empty leaf.
    ZeroOrEmpty,
}

impl Repeat {
    /// Returns true if the group succeeds without matching.
    #[must_use]
    pub fn allows_zero(self) -> bool {
        matches!(self, Self::ZeroOrMore | Self::ZeroOrOne | Self::ZeroOrEmpty)
    }

    /// Returns true if the group stops after one match.
    #[must_use]
    pub fn at_most_once(self) -> bool {
        matches!(self, Self::ZeroOrOne | Self::ZeroOrEmpty)
    }
}

/// An ordered group of entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Patterns {
    entries: Vec<PatternEntry>,
    operator: Operator,
    repeat: Repeat,
}

impl Patterns {
    /// Creates a group.
    #[must_use]
    pub fn new(entries: Vec<PatternEntry>, operator: Operator, repeat: Repeat) -> Self {
        Self {
            entries,
            operator,
            repeat,
        }
    }

    /// Creates a sequence.
    #[must_use]
    pub fn and(entries: impl IntoIterator<Item = PatternEntry>) -> Self {
        Self::new(entries.into_iter().collect(), Operator::And, Repeat::NoRepeat)
    }

    /// Creates an ordered choice.
    #[must_use]
    pub fn or(entries: impl IntoIterator<Item = PatternEntry>) -> Self {
        Self::new(entries.into_iter().collect(), Operator::Or, Repeat::NoRepeat)
    }

    /// Returns this group with another repeat mode.
    #[must_use]
    pub fn repeated(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Returns the entries in declared order.
    #[must_use]
    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    /// Returns the combining operator.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the repeat mode.
    #[must_use]
    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the group has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A pattern or a nested group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternEntry {
    /// A single pattern.
    Pattern(Pattern),
    /// A nested group.
    Patterns(Patterns),
}

impl From<Pattern> for PatternEntry {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<Patterns> for PatternEntry {
    fn from(patterns: Patterns) -> Self {
        Self::Patterns(patterns)
    }
}

/// Tree-shape directive of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Unwrap {
    /// Keep the rule's node.
    #[default]
    Off,
    /// Replace the node by its child when it has exactly one.
    OneTime,
    /// Replace the node by its children.
    Always,
}

impl Unwrap {
    /// Splits a rule key into its directive and bare name.
    #[must_use]
    pub fn split_marker(key: &str) -> (Self, &str) {
        if let Some(name) = key.strip_prefix('?') {
            (Self::OneTime, name)
        } else if let Some(name) = key.strip_prefix('*') {
            (Self::Always, name)
        } else {
            (Self::Off, key)
        }
    }
}

/// An immutable grammar.
///
/// Construction compiles every regex terminal once and rejects rules that
/// could re-enter themselves at the same token position.
#[derive(Debug, Clone)]
pub struct Rules {
    rules: IndexMap<SmolStr, PatternEntry>,
    unwraps: FxHashMap<SmolStr, Unwrap>,
    regexes: FxHashMap<SmolStr, Regex>,
    analysis: Analysis,
}

impl Rules {
    /// Builds a grammar from `(key, entry)` pairs. Keys may carry an unwrap
    /// marker (`?name`, `*name`). A repeated name replaces the earlier entry.
    ///
    /// # Errors
    ///
    /// - [`GrammarError::InvalidRegex`] if a regex terminal does not compile.
    /// - [`GrammarError::UnsupportedRecursion`] if a rule can re-enter itself
    ///   without consuming a token: right recursion, a rule that is its own
    ///   alternative, or a single-element self reference.
    pub fn new<K: AsRef<str>>(
        entries: impl IntoIterator<Item = (K, PatternEntry)>,
    ) -> Result<Self, GrammarError> {
        let mut rules = IndexMap::new();
        let mut unwraps = FxHashMap::default();
        for (key, entry) in entries {
            let (unwrap, name) = Unwrap::split_marker(key.as_ref());
            let name = SmolStr::new(name);
            if unwrap == Unwrap::Off {
                unwraps.remove(&name);
            } else {
                unwraps.insert(name.clone(), unwrap);
            }
            rules.insert(name, entry);
        }

        let mut regexes = FxHashMap::default();
        for entry in rules.values() {
            compile_regexes(entry, &mut regexes)?;
        }

        let analysis = Analysis::new(&rules);
        analysis.check_recursion(&rules)?;

        Ok(Self {
            rules,
            unwraps,
            regexes,
            analysis,
        })
    }

    /// Returns the rule names in declared order, without markers.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.keys().map(SmolStr::as_str)
    }

    /// Returns the rules in declared order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &PatternEntry)> + '_ {
        self.rules.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Returns the entry of a rule.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PatternEntry> {
        self.rules.get(name)
    }

    /// Returns the declaration index, stored name and entry of a rule.
    pub(crate) fn get_full(&self, name: &str) -> Option<(usize, &SmolStr, &PatternEntry)> {
        self.rules.get_full(name)
    }

    /// Returns true if the rule is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Returns the unwrap directive of a rule; undefined rules are `Off`.
    #[must_use]
    pub fn unwrap_of(&self, name: &str) -> Unwrap {
        self.unwraps.get(name).copied().unwrap_or_default()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compares a token's text against a terminal.
    pub(crate) fn is_match(&self, terminal: &Terminal, text: &str) -> bool {
        match terminal.comparison {
            Comparison::Equals => terminal.value() == text,
            Comparison::Regexp => self
                .regexes
                .get(terminal.value())
                .is_some_and(|regex| regex.is_match(text)),
        }
    }

    /// Returns true if `group`, inside `rule`, is a sequence whose first
    /// element leads back into `rule`.
    pub(crate) fn is_left_recursive(&self, group: &Patterns, rule: &str) -> bool {
        self.analysis.is_left_recursive(group, rule)
    }
}

impl PartialEq for Rules {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules && self.unwraps == other.unwraps
    }
}

impl Eq for Rules {}

fn compile_regexes(
    entry: &PatternEntry,
    regexes: &mut FxHashMap<SmolStr, Regex>,
) -> Result<(), GrammarError> {
    match entry {
        PatternEntry::Pattern(Pattern::Terminal(terminal))
            if terminal.comparison == Comparison::Regexp =>
        {
            let value = terminal.value();
            if !regexes.contains_key(value) {
                let regex = Regex::new(&format!("^(?:{value})$")).map_err(|err| {
                    GrammarError::InvalidRegex {
                        expression: value.into(),
                        message: err.to_string(),
                    }
                })?;
                regexes.insert(value.into(), regex);
            }
            Ok(())
        }
        PatternEntry::Pattern(_) => Ok(()),
        PatternEntry::Patterns(group) => group
            .entries()
            .iter()
            .try_for_each(|entry| compile_regexes(entry, regexes)),
    }
}
