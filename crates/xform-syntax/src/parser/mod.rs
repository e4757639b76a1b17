//! Grammar-driven parser.
//!
//! [`SyntaxParser`] matches a token stream against [`Rules`] and builds an
//! [`Ast`]. Matching runs from the last token towards the first, which lets
//! a plain recursive descent handle sequences without lookahead; rules that
//! recurse through their leading element are matched by anchoring the base
//! case and folding the repeated tails onto it.
//!
//! Only [`SyntaxParser::parse`] reports errors. Mismatches inside the
//! descent are ordinary return values, so every ordered choice can fall
//! through to its next alternative.

mod context;
mod matcher;

use smol_str::SmolStr;
use thiserror::Error;
use tracing::debug;

use crate::ast::Ast;
use crate::diagnostics::{Diagnostic, ErrorCollector};
use crate::lexer::{Token, Tokenize, TokenizeError, Tokenizer};
use crate::rule::{Rules, Unwrap};
use context::Context;
use matcher::Matcher;

/// Error raised by [`SyntaxParser::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The source could not be tokenized.
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    /// The entry rule is not defined.
    #[error("entry rule '{0}' is not defined")]
    UnknownEntry(SmolStr),
    /// The parse failed after referencing an undefined rule.
    #[error("rule '{rule}' is referenced but not defined")]
    UnknownRule {
        /// The first undefined rule encountered.
        rule: SmolStr,
    },
    /// The entry rule did not consume every token.
    #[error("syntax error\n{0}")]
    Syntax(Diagnostic),
}

impl ParseError {
    /// Returns the diagnostic of a syntax error.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Syntax(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }
}

/// Parses source text with a fixed grammar.
///
/// The parser holds no per-call state; one instance may serve concurrent
/// `parse` calls from several threads.
#[derive(Debug, Clone)]
pub struct SyntaxParser<T = Tokenizer> {
    rules: Rules,
    tokenizer: T,
}

impl SyntaxParser {
    /// Creates a parser that tokenizes with the default [`Tokenizer`].
    #[must_use]
    pub fn new(rules: Rules) -> Self {
        Self::with_tokenizer(rules, Tokenizer::new())
    }
}

impl<T: Tokenize> SyntaxParser<T> {
    /// Creates a parser with a custom tokenizer.
    #[must_use]
    pub fn with_tokenizer(rules: Rules, tokenizer: T) -> Self {
        Self { rules, tokenizer }
    }

    /// Returns the grammar.
    #[must_use]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Returns the tokenizer.
    #[must_use]
    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Tokenizes `source` and parses it from rule `entry`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Tokenize`] if the source cannot be tokenized.
    /// - [`ParseError::UnknownEntry`] if `entry` is not a rule.
    /// - [`ParseError::UnknownRule`] if the parse failed after referencing
    ///   an undefined rule.
    /// - [`ParseError::Syntax`] if `entry` does not consume every token.
    pub fn parse(&self, source: &str, entry: &str) -> Result<Ast, ParseError> {
        let tokens = self.tokenizer.tokenize(source)?;
        self.parse_tokens(source, &tokens, entry)
    }

    /// Parses already tokenized `source` from rule `entry`.
    ///
    /// `source` is only read to locate diagnostics.
    ///
    /// # Errors
    ///
    /// See [`SyntaxParser::parse`].
    pub fn parse_tokens(
        &self,
        source: &str,
        tokens: &[Token],
        entry: &str,
    ) -> Result<Ast, ParseError> {
        if !self.rules.contains(entry) {
            return Err(ParseError::UnknownEntry(entry.into()));
        }

        debug!("parse start entry={} tokens={}", entry, tokens.len());
        let matcher = Matcher::new(&self.rules, tokens);
        let matched = matcher.match_rule(entry, Context::new(tokens.len(), entry));

        let consumed = match matched {
            Some((steps, root)) if steps == tokens.len() => {
                debug!("parse finished entry={} tokens={}", entry, tokens.len());
                return Ok(self.unwrap_root(root));
            }
            Some((steps, _)) => steps.max(matcher.furthest()),
            None => matcher.furthest(),
        };

        if let Some(rule) = matcher.take_missing() {
            debug!("parse failed entry={} undefined rule={}", entry, rule);
            return Err(ParseError::UnknownRule { rule });
        }

        let diagnostic = ErrorCollector::new(source, tokens, consumed).diagnostic();
        debug!(
            "parse failed entry={} consumed={}/{}",
            entry,
            consumed,
            tokens.len()
        );
        Err(ParseError::Syntax(diagnostic))
    }

    /// The root has no parent to splice into, so it collapses only onto a
    /// single child.
    fn unwrap_root(&self, root: Ast) -> Ast {
        let collapse = root.children().len() == 1
            && matches!(
                self.rules.unwrap_of(root.name()),
                Unwrap::OneTime | Unwrap::Always
            );
        if !collapse {
            return root;
        }
        root.into_children().pop().unwrap_or_else(Ast::empty)
    }
}
