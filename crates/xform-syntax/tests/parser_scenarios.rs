mod common;
use common::*;

use std::thread;

#[test]
fn calculator_keeps_operators_as_leaves() {
    let parser = parser_for(CALCULATOR);
    assert_eq!(
        simplified(&parser, "1 + 2 - 3\n", "entry"),
        tree(
            "entry",
            vec![
                tree(
                    "expr",
                    vec![
                        leaf("NUM", "1"),
                        leaf("expr", "+"),
                        leaf("NUM", "2"),
                        leaf("expr", "-"),
                        leaf("NUM", "3"),
                    ]
                ),
                leaf("entry", "\n"),
            ]
        )
    );
}

#[test]
fn calculator_rejects_missing_operand() {
    let parser = parser_for(CALCULATOR);
    let err = parser.parse("1 + \n", "entry").unwrap_err();
    let diagnostic = err.diagnostic().expect("syntax error");
    assert_eq!(diagnostic.total, 3);
    assert_eq!(diagnostic.token, "+");
}

#[test]
fn unmatched_choice_points_at_last_token() {
    let parser = parser_for(r#"atom := "a" | "b""#);
    let err = parser.parse("c", "atom").unwrap_err();
    let ParseError::Syntax(diagnostic) = &err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(diagnostic.summary, "consumed: 0/1, token: \"c\"\n(1) >>> c\n        ^");
    assert_eq!(err.to_string(), format!("syntax error\n{}", diagnostic.summary));
}

#[test]
fn expression_nests_calls_members_and_indexers() {
    let parser = expression_parser();
    let inner = tree(
        "comp",
        vec![
            leaf("str", "\"a\""),
            tree("op_comp", vec![leaf("op_in", "in")]),
            tree("var", vec![leaf("name", "b")]),
        ],
    );
    let left = tree(
        "calc_sum",
        vec![
            tree(
                "relay",
                vec![
                    tree(
                        "invoke",
                        vec![
                            tree(
                                "relay",
                                vec![
                                    tree("var", vec![leaf("name", "a")]),
                                    leaf("relay", "."),
                                    leaf("name", "b"),
                                ],
                            ),
                            leaf("invoke", "("),
                            leaf("__empty__", ""),
                            leaf("invoke", ")"),
                        ],
                    ),
                    leaf("relay", "."),
                    leaf("name", "c"),
                ],
            ),
            leaf("op_add", "+"),
            tree("calc_unary", vec![leaf("op_unary", "-"), leaf("int", "1")]),
        ],
    );
    let right = tree(
        "indexer",
        vec![
            tree(
                "relay",
                vec![
                    tree(
                        "invoke",
                        vec![
                            tree("var", vec![leaf("name", "d")]),
                            leaf("invoke", "("),
                            tree("args", vec![inner]),
                            leaf("invoke", ")"),
                        ],
                    ),
                    leaf("relay", "."),
                    leaf("name", "e"),
                ],
            ),
            leaf("indexer", "["),
            leaf("int", "0"),
            leaf("indexer", "]"),
        ],
    );

    assert_eq!(
        simplified(&parser, "a.b().c + -1 == d(\"a\" in b).e[0]", "entry"),
        tree(
            "entry",
            vec![tree(
                "comp",
                vec![left, tree("op_comp", vec![leaf("op_comp_s", "==")]), right]
            )]
        )
    );
}

#[test]
fn member_chain_renders_left_nested() {
    let parser = expression_parser();
    let tree = parser.parse("self.data.models", "entry").unwrap();

    insta::assert_snapshot!(tree.pretty("  "), @r#"
    ('entry', [
      ('relay', [
        ('relay', [
          ('var', [
            ('name', "self")
          ]),
          ('relay', "."),
          ('name', "data")
        ]),
        ('relay', "."),
        ('name', "models")
      ])
    ])
    "#);
}

#[test]
fn member_chain_normalizes_children_first() {
    let parser = expression_parser();
    let records = parser.parse("self.data.models", "entry").unwrap().normalize();
    let summary: Vec<_> = records
        .iter()
        .map(|record| {
            (
                record.id,
                record.name.as_str(),
                record.literal.as_str(),
                record.children.clone(),
            )
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            (0, "name", "self", vec![]),
            (1, "var", "", vec![0]),
            (2, "relay", ".", vec![]),
            (3, "name", "data", vec![]),
            (4, "relay", "", vec![1, 2, 3]),
            (5, "relay", ".", vec![]),
            (6, "name", "models", vec![]),
            (7, "relay", "", vec![4, 5, 6]),
            (8, "entry", "", vec![7]),
        ]
    );

    let json = serde_json::to_string_pretty(&records[4]).unwrap();
    insta::assert_snapshot!(json, @r#"
    {
      "id": 4,
      "name": "relay",
      "literal": "",
      "children": [
        1,
        2,
        3
      ]
    }
    "#);
}

#[test]
fn arguments_are_comma_separated() {
    let parser = expression_parser();
    assert_eq!(
        simplified(&parser, "f(1, x)", "entry"),
        tree(
            "entry",
            vec![tree(
                "invoke",
                vec![
                    tree("var", vec![leaf("name", "f")]),
                    leaf("invoke", "("),
                    tree(
                        "args",
                        vec![
                            leaf("int", "1"),
                            leaf("args", ","),
                            tree("var", vec![leaf("name", "x")]),
                        ]
                    ),
                    leaf("invoke", ")"),
                ]
            )]
        )
    );
}

#[test]
fn single_atom_collapses_through_unwrapped_rules() {
    let parser = expression_parser();
    assert_eq!(
        simplified(&parser, "1.5", "entry"),
        tree("entry", vec![leaf("float", "1.5")])
    );
    assert_eq!(
        simplified(&parser, "'q'", "entry"),
        tree("entry", vec![leaf("str", "'q'")])
    );
}

#[test]
fn parsing_is_deterministic() {
    let parser = expression_parser();
    let source = "a.b(c)[1] + 2";
    assert_eq!(
        parser.parse(source, "entry").unwrap(),
        parser.parse(source, "entry").unwrap()
    );
}

#[test]
fn parser_is_shared_across_threads() {
    let parser = expression_parser();
    let sources = ["a.b", "f(x)[0]", "1 + 2 == 3", "x.y.z"];
    let expected: Vec<_> = sources
        .iter()
        .map(|source| parser.parse(source, "entry").unwrap())
        .collect();

    thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| {
                let parser = &parser;
                scope.spawn(move || parser.parse(source, "entry"))
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap().unwrap(), expected);
        }
    });
}

#[test]
fn unknown_entry_is_rejected_before_matching() {
    let parser = expression_parser();
    assert_eq!(
        parser.parse("a", "statement").unwrap_err(),
        ParseError::UnknownEntry("statement".into())
    );
}

#[test]
fn undefined_reference_is_reported_on_failure() {
    let parser = parser_for("entry := item | name\nname := /[a-z]+/");
    assert_eq!(
        parser.parse("1", "entry").unwrap_err(),
        ParseError::UnknownRule {
            rule: "item".into()
        }
    );
    // The fallback alternative still matches.
    assert!(parser.parse("abc", "entry").is_ok());
}

#[test]
fn trailing_tokens_are_a_syntax_error() {
    let parser = expression_parser();
    let err = parser.parse("a b", "entry").unwrap_err();
    let diagnostic = err.diagnostic().expect("syntax error");
    assert_eq!((diagnostic.consumed, diagnostic.total), (1, 2));
    assert_eq!(diagnostic.token, "a");
    assert_eq!((diagnostic.line, diagnostic.column), (1, 1));
}

const BLOCKS: &str = r#"entry := (stmt)+
stmt[1] := block | line
block := name ":" "\n" "\\INDENT" (stmt)+ "\\DEDENT"
line := name "\n"
name := /[a-z]+/"#;

#[test]
fn indented_blocks_nest_statements() {
    let parser = parser_for(BLOCKS);
    let line = |name| tree("line", vec![leaf("name", name), leaf("line", "\n")]);
    assert_eq!(
        simplified(&parser, "a:\n  b\n  c\nd\n", "entry"),
        tree(
            "entry",
            vec![
                tree(
                    "block",
                    vec![
                        leaf("name", "a"),
                        leaf("block", ":"),
                        leaf("block", "\n"),
                        leaf("block", "\\INDENT"),
                        line("b"),
                        line("c"),
                        leaf("block", "\\DEDENT"),
                    ]
                ),
                line("d"),
            ]
        )
    );
}

#[test]
fn unclosed_block_is_closed_at_end_of_input() {
    let parser = parser_for(BLOCKS);
    let tree = parser.parse("a:\n  b", "entry").unwrap();
    let texts: Vec<_> = tree.leaves().iter().map(|leaf| leaf.token().text()).collect();
    assert_eq!(texts, vec!["a", ":", "\n", "\\INDENT", "b", "\n", "\\DEDENT"]);
}
