//! Grammar descriptions.
//!
//! Grammars are written one rule per line:
//!
//! ```text
//! entry := (stmt)+
//! stmt := name [args] "\n"
//! args[1] := name (name)*
//! name := /[a-z]+/
//! ```
//!
//! The description language is itself parsed by [`SyntaxParser`], seeded
//! with the hand-built [`bootstrap_rules`]. [`load_grammar`] runs that parse
//! and converts the tree with [`Rules::from_ast`].

use tracing::debug;

use crate::ast::{Ast, AstTree};
use crate::lexer::GrammarLexer;
use crate::parser::SyntaxParser;
use crate::rule::{GrammarError, Operator, Pattern, PatternEntry, Patterns, Repeat, Rules};

/// The description of the bootstrap grammar, in its own notation.
pub const BOOTSTRAP_GRAMMAR: &str = r#"entry := (rule)+
rule := symbol ["[" unwrap "]"] ":=" expr "\n"
expr[1] := terms_or
terms_or[1] := terms ("|" terms)*
terms[1] := term (term)*
term[1] := symbol | string | regexp | expr_opt | expr_rep
expr_opt := "[" expr "]"
expr_rep := "(" expr ")" [repeat]
symbol := /[a-zA-Z_][0-9a-zA-Z_]*/
string := /"(\\.|[^"\\])+"/
regexp := /[/].+[/]/
repeat := /[*+?]/
unwrap := /[1*]/"#;

fn symbol(name: &str) -> PatternEntry {
    Pattern::symbol(name).into()
}

fn literal(value: &str) -> PatternEntry {
    Pattern::equals(value).into()
}

fn regexp(value: &str) -> PatternEntry {
    Pattern::regexp(value).into()
}

/// Builds the grammar that parses grammar descriptions.
///
/// # Errors
///
/// Never fails in practice; the error type is shared with [`Rules::new`].
pub fn bootstrap_rules() -> Result<Rules, GrammarError> {
    Rules::new([
        ("entry", Patterns::and([symbol("rule")]).repeated(Repeat::OneOrMore).into()),
        (
            "rule",
            Patterns::and([
                symbol("symbol"),
                Patterns::and([literal("["), symbol("unwrap"), literal("]")])
                    .repeated(Repeat::ZeroOrEmpty)
                    .into(),
                literal(":="),
                symbol("expr"),
                literal("\n"),
            ])
            .into(),
        ),
        ("?expr", symbol("terms_or")),
        (
            "?terms_or",
            Patterns::and([
                symbol("terms"),
                Patterns::and([literal("|"), symbol("terms")])
                    .repeated(Repeat::ZeroOrMore)
                    .into(),
            ])
            .into(),
        ),
        (
            "?terms",
            Patterns::and([
                symbol("term"),
                Patterns::and([symbol("term")]).repeated(Repeat::ZeroOrMore).into(),
            ])
            .into(),
        ),
        (
            "?term",
            Patterns::or([
                symbol("symbol"),
                symbol("string"),
                symbol("regexp"),
                symbol("expr_opt"),
                symbol("expr_rep"),
            ])
            .into(),
        ),
        (
            "expr_opt",
            Patterns::and([literal("["), symbol("expr"), literal("]")]).into(),
        ),
        (
            "expr_rep",
            Patterns::and([
                literal("("),
                symbol("expr"),
                literal(")"),
                Patterns::and([symbol("repeat")])
                    .repeated(Repeat::ZeroOrEmpty)
                    .into(),
            ])
            .into(),
        ),
        ("symbol", regexp("[a-zA-Z_][0-9a-zA-Z_]*")),
        ("string", regexp(r#""(\\.|[^"\\])+""#)),
        ("regexp", regexp("[/].+[/]")),
        ("repeat", regexp("[*+?]")),
        ("unwrap", regexp("[1*]")),
    ])
}

/// Parses a grammar description into [`Rules`].
///
/// # Errors
///
/// - [`GrammarError::Syntax`] if the text is not a valid description.
/// - Any error of [`Rules::new`] for the described rules.
pub fn load_grammar(text: &str) -> Result<Rules, GrammarError> {
    let parser = SyntaxParser::with_tokenizer(bootstrap_rules()?, GrammarLexer::new());
    let tree = parser.parse(text, "entry")?;
    let rules = Rules::from_ast(&tree)?;
    debug!("grammar loaded rules={}", rules.len());
    Ok(rules)
}

impl Rules {
    /// Converts a tree produced by parsing with [`bootstrap_rules`].
    ///
    /// # Errors
    ///
    /// - [`GrammarError::MalformedTree`] if a node has an unexpected name or
    ///   arity.
    /// - Any error of [`Rules::new`] for the described rules.
    pub fn from_ast(root: &Ast) -> Result<Self, GrammarError> {
        if root.name() != "entry" || root.token().is_some() {
            return Err(malformed(root, "expected the grammar entry tree"));
        }

        let entries = root
            .children()
            .iter()
            .map(convert_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries)
    }
}

fn malformed(node: &Ast, reason: &str) -> GrammarError {
    GrammarError::MalformedTree {
        node: node.name().into(),
        reason: reason.to_string(),
    }
}

fn leaf_text<'a>(node: &'a Ast, name: &str) -> Option<&'a str> {
    match node {
        Ast::Leaf(leaf) if leaf.name() == name => Some(leaf.token().text()),
        _ => None,
    }
}

/// Children of `tree` without the punctuation its own rule matched.
fn significant(tree: &AstTree) -> Vec<&Ast> {
    tree.children()
        .iter()
        .filter(|child| child.token().is_none() || child.name() != tree.name())
        .collect()
}

fn convert_rule(node: &Ast) -> Result<(String, PatternEntry), GrammarError> {
    let (Ast::Tree(tree), "rule") = (node, node.name()) else {
        return Err(malformed(node, "expected a rule"));
    };
    let children = significant(tree);
    let [name, unwrap, expr] = children[..] else {
        return Err(malformed(node, "expected symbol, unwrap and expression"));
    };

    let name = leaf_text(name, "symbol").ok_or_else(|| malformed(name, "expected a symbol"))?;
    let key = if unwrap.is_empty_leaf() {
        name.to_string()
    } else {
        match leaf_text(unwrap, "unwrap") {
            Some("1") => format!("?{name}"),
            Some("*") => format!("*{name}"),
            _ => return Err(malformed(unwrap, "expected `1` or `*`")),
        }
    };

    Ok((key, convert_expr(expr)?))
}

fn convert_expr(node: &Ast) -> Result<PatternEntry, GrammarError> {
    let tree = match node {
        Ast::Leaf(leaf) => {
            let text = leaf.token().text();
            return match leaf.name() {
                "symbol" => Ok(symbol(text)),
                "string" => text
                    .strip_prefix('"')
                    .and_then(|text| text.strip_suffix('"'))
                    .map(|value| literal(&unescape(value)))
                    .ok_or_else(|| malformed(node, "expected a quoted string")),
                "regexp" => Ok(Pattern::terminal(text)?.into()),
                _ => Err(malformed(node, "expected a symbol, string or regexp")),
            };
        }
        Ast::Tree(tree) => tree,
    };

    let children = significant(tree);
    match (tree.name(), &children[..]) {
        ("terms" | "terms_or", [_, _, ..]) => {
            let entries = children
                .iter()
                .copied()
                .map(convert_expr)
                .collect::<Result<Vec<_>, _>>()?;
            let operator = if tree.name() == "terms" {
                Operator::And
            } else {
                Operator::Or
            };
            Ok(Patterns::new(entries, operator, Repeat::NoRepeat).into())
        }
        ("expr_opt", [inner]) => Ok(with_repeat(convert_expr(inner)?, Repeat::ZeroOrEmpty)),
        ("expr_rep", [inner, repeat]) => {
            let repeat = if repeat.is_empty_leaf() {
                Repeat::NoRepeat
            } else {
                match leaf_text(repeat, "repeat") {
                    Some("*") => Repeat::ZeroOrMore,
                    Some("+") => Repeat::OneOrMore,
                    Some("?") => Repeat::ZeroOrOne,
                    _ => return Err(malformed(repeat, "expected `*`, `+` or `?`")),
                }
            };
            Ok(with_repeat(convert_expr(inner)?, repeat))
        }
        _ => Err(malformed(node, "unexpected expression node")),
    }
}

/// Applies a bracket's repeat mode. A bare group takes the mode itself;
/// anything else becomes the single entry of a new group.
fn with_repeat(entry: PatternEntry, repeat: Repeat) -> PatternEntry {
    match entry {
        PatternEntry::Patterns(group) if repeat == Repeat::NoRepeat => group.into(),
        PatternEntry::Patterns(group) if group.repeat() == Repeat::NoRepeat => {
            group.repeated(repeat).into()
        }
        entry => Patterns::new(vec![entry], Operator::And, repeat).into(),
    }
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(ch @ ('\\' | '"')) => out.push(ch),
            Some(ch) => {
                out.push('\\');
                out.push(ch);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Token;

    fn parse_description(text: &str) -> Ast {
        SyntaxParser::with_tokenizer(bootstrap_rules().unwrap(), GrammarLexer)
            .parse(text, "entry")
            .unwrap()
    }

    #[test]
    fn description_parses_into_rule_nodes() {
        let text = [
            "entry := exp",
            "exp[1] := atom",
            "atom[1] := relay | invoke | indexer | atom",
            "relay := atom \".\" name",
            "invoke := atom \"(\" [args] \")\"",
            "indexer := atom \"[\" exp \"]\"",
            "args := exp (exp)*",
            "bool := /False|True/",
        ]
        .join("\n");

        expect_test::expect![[r#"
            ('entry', [
              ('rule', [
                ('symbol', "entry"),
                ('__empty__', ""),
                ('rule', ":="),
                ('symbol', "exp"),
                ('rule', "\n")
              ]),
              ('rule', [
                ('symbol', "exp"),
                ('rule', "["),
                ('unwrap', "1"),
                ('rule', "]"),
                ('rule', ":="),
                ('symbol', "atom"),
                ('rule', "\n")
              ]),
              ('rule', [
                ('symbol', "atom"),
                ('rule', "["),
                ('unwrap', "1"),
                ('rule', "]"),
                ('rule', ":="),
                ('terms_or', [
                  ('symbol', "relay"),
                  ('terms_or', "|"),
                  ('symbol', "invoke"),
                  ('terms_or', "|"),
                  ('symbol', "indexer"),
                  ('terms_or', "|"),
                  ('symbol', "atom")
                ]),
                ('rule', "\n")
              ]),
              ('rule', [
                ('symbol', "relay"),
                ('__empty__', ""),
                ('rule', ":="),
                ('terms', [
                  ('symbol', "atom"),
                  ('string', "\".\""),
                  ('symbol', "name")
                ]),
                ('rule', "\n")
              ]),
              ('rule', [
                ('symbol', "invoke"),
                ('__empty__', ""),
                ('rule', ":="),
                ('terms', [
                  ('symbol', "atom"),
                  ('string', "\"(\""),
                  ('expr_opt', [
                    ('expr_opt', "["),
                    ('symbol', "args"),
                    ('expr_opt', "]")
                  ]),
                  ('string', "\")\"")
                ]),
                ('rule', "\n")
              ]),
              ('rule', [
                ('symbol', "indexer"),
                ('__empty__', ""),
                ('rule', ":="),
                ('terms', [
                  ('symbol', "atom"),
                  ('string', "\"[\""),
                  ('symbol', "exp"),
                  ('string', "\"]\"")
                ]),
                ('rule', "\n")
              ]),
              ('rule', [
                ('symbol', "args"),
                ('__empty__', ""),
                ('rule', ":="),
                ('terms', [
                  ('symbol', "exp"),
                  ('expr_rep', [
                    ('expr_rep', "("),
                    ('symbol', "exp"),
                    ('expr_rep', ")"),
                    ('repeat', "*")
                  ])
                ]),
                ('rule', "\n")
              ]),
              ('rule', [
                ('symbol', "bool"),
                ('__empty__', ""),
                ('rule', ":="),
                ('regexp', "/False|True/"),
                ('rule', "\n")
              ])
            ])"#]]
        .assert_eq(&parse_description(&text).pretty("  "));
    }

    #[test]
    fn rules_render_back_to_description() {
        let rules = load_grammar(
            "entry := exp\n\
             exp[1] := primary\n\
             primary[1] := relay | name\n\
             relay := primary \".\" name\n\
             call := name \"(\" [args] \")\"\n\
             args[*] := exp (\",\" exp)*\n\
             name := /[a-z]+/\n",
        )
        .unwrap();

        expect_test::expect![[r#"
            entry := exp
            exp[1] := primary
            primary[1] := relay | name
            relay := primary "." name
            call := name "(" [args] ")"
            args[*] := exp ("," exp)*
            name := /[a-z]+/"#]]
        .assert_eq(&rules.pretty());
    }

    #[test]
    fn bootstrap_text_describes_the_seed() {
        let seed = bootstrap_rules().unwrap();
        assert_eq!(seed.pretty(), BOOTSTRAP_GRAMMAR);
        assert_eq!(load_grammar(BOOTSTRAP_GRAMMAR).unwrap(), seed);
    }

    #[test]
    fn strings_are_unescaped() {
        let rules = load_grammar(r#"line := "a\tb" "\"" "\\" "\n""#).unwrap();
        let Some(PatternEntry::Patterns(group)) = rules.get("line") else {
            panic!("expected a sequence");
        };
        let values: Vec<_> = group
            .entries()
            .iter()
            .map(|entry| match entry {
                PatternEntry::Pattern(Pattern::Terminal(terminal)) => terminal.value().to_string(),
                other => panic!("unexpected entry {other:?}"),
            })
            .collect();
        assert_eq!(values, vec!["a\tb", "\"", "\\", "\n"]);
        assert_eq!(rules.pretty(), r#"line := "a\tb" "\"" "\\" "\n""#);
    }

    #[test]
    fn malformed_tree_is_rejected() {
        let name = Ast::leaf("symbol", Token::empty());
        let root = Ast::tree("entry", vec![Ast::tree("rule", vec![name])]);
        let err = Rules::from_ast(&root).unwrap_err();
        assert!(matches!(err, GrammarError::MalformedTree { node, .. } if node == "rule"));

        let err = Rules::from_ast(&Ast::tree("rules", vec![])).unwrap_err();
        assert!(matches!(err, GrammarError::MalformedTree { node, .. } if node == "rules"));
    }

    #[test]
    fn invalid_text_reports_syntax() {
        let err = load_grammar("entry = exp\n").unwrap_err();
        assert!(matches!(err, GrammarError::Syntax(_)));
    }

    #[test]
    fn same_cursor_recursion_is_rejected_on_load() {
        let err = load_grammar("atom := relay | atom\nrelay := atom \".\" atom\n").unwrap_err();
        assert!(matches!(err, GrammarError::UnsupportedRecursion { .. }));
    }
}
