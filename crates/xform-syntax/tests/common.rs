//! Shared grammars and helpers for integration tests.
#![allow(dead_code, unused_imports)]

pub use xform_syntax::{load_grammar, Ast, ParseError, Rules, Simplified, SyntaxParser};

/// A Python-like expression grammar with transitive left recursion through
/// `primary`.
pub const EXPRESSION_GRAMMAR: &str = r#"entry := exp
exp[1] := comp
comp[1] := calc_sum (op_comp calc_sum)*
calc_sum[1] := calc_unary (op_add calc_unary)*
calc_unary[1] := op_unary primary | primary
primary[1] := relay | invoke | indexer | atom
relay := primary "." name
invoke := primary "(" [args] ")"
indexer := primary "[" exp "]"
atom[1] := var | bool | none | str | int | float
var := name
args := exp ("," exp)*
op_comp := op_comp_s | op_in
op_comp_s := /==|!=|<=|>=|<|>/
op_in := "in"
op_add := /[-+]/
op_unary := /[-~]/
bool := /false|true/
int := /0|[1-9][0-9]*/
float := /(0|[1-9][0-9]*)[.][0-9]+/
str := /'[^']*'|"[^"]*"/
none := "None"
name := /[a-zA-Z_][0-9a-zA-Z_]*/"#;

/// Sums and differences of integers, one expression per line.
pub const CALCULATOR: &str = r#"entry := expr "\n"
expr := NUM (("+" | "-") NUM)*
NUM := /[0-9]+/"#;

/// Routes `tracing` output through the test harness. Set `RUST_LOG=trace`
/// to see the matcher's left-recursion decisions.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn expression_parser() -> SyntaxParser {
    init_tracing();
    SyntaxParser::new(load_grammar(EXPRESSION_GRAMMAR).expect("expression grammar loads"))
}

pub fn parser_for(grammar: &str) -> SyntaxParser {
    init_tracing();
    SyntaxParser::new(load_grammar(grammar).expect("grammar loads"))
}

pub fn leaf(name: &str, text: &str) -> Simplified {
    Simplified::leaf(name, text)
}

pub fn tree(name: &str, children: Vec<Simplified>) -> Simplified {
    Simplified::tree(name, children)
}

/// Parses `source` from `entry` and returns the simplified tree.
pub fn simplified(parser: &SyntaxParser, source: &str, entry: &str) -> Simplified {
    match parser.parse(source, entry) {
        Ok(tree) => tree.simplify(),
        Err(err) => panic!("parse of {source:?} failed: {err}"),
    }
}
