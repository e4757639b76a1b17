//! `xform-syntax` - Tokenizer, grammar model and grammar-driven parser.
//!
//! This crate is the front end of a source-to-source translator:
//!
//! - **Lexer**: Splits source text into tokens by configurable domains
//! - **Rules**: Declarative grammar of terminals, rule references and groups
//! - **Parser**: Matches tokens against the rules and builds an AST
//! - **Grammar**: Loads rules from their textual description
//!
//! # Design
//!
//! - **Back to front**: Sequences are matched from their last element, which
//!   lets left-recursive rules be anchored on their base case and extended
//!   to the left without unbounded recursion
//! - **Ordered choice**: The first matching alternative wins
//! - **All or nothing**: A parse consumes every token or fails with a
//!   located diagnostic
//! - **Self-hosted grammar**: The description language is parsed by the same
//!   engine, seeded with a hand-built grammar
//!
//! # Example
//!
//! ```
//! use xform_syntax::{load_grammar, SyntaxParser};
//!
//! let rules = load_grammar(
//!     "entry := path\n\
//!      path := path \".\" name | name\n\
//!      name := /[a-z]+/\n",
//! )
//! .unwrap();
//!
//! let tree = SyntaxParser::new(rules).parse("a.b", "entry").unwrap();
//! assert_eq!(
//!     tree.pretty("  "),
//!     "('entry', [\n  ('path', [\n    ('path', [\n      ('name', \"a\")\n    ]),\n    ('path', \".\"),\n    ('name', \"b\")\n  ])\n])"
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod ast;
pub mod diagnostics;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod rule;

pub use ast::{Ast, Normal, Simplified};
pub use diagnostics::{Diagnostic, ErrorCollector};
pub use grammar::{bootstrap_rules, load_grammar};
pub use lexer::{lex, tokenize, GrammarLexer, Token, TokenDefinition, TokenKind, Tokenize, Tokenizer};
pub use parser::{ParseError, SyntaxParser};
pub use rule::{GrammarError, Pattern, Patterns, Rules};
