//! Rendering a grammar back to description text.

use super::{Comparison, Operator, Pattern, PatternEntry, Patterns, Repeat, Rules, Terminal, Unwrap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Right-hand side of a rule.
    Top,
    /// Alternative of an ordered choice.
    Alternative,
    /// Element of a sequence.
    Item,
}

impl Rules {
    /// Renders the grammar as description text, one rule per line.
    ///
    /// Loading the rendered text yields rules equal to `self`.
    #[must_use]
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        for (index, (name, entry)) in self.items().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let suffix = match self.unwrap_of(name) {
                Unwrap::Off => "",
                Unwrap::OneTime => "[1]",
                Unwrap::Always => "[*]",
            };
            out.push_str(name);
            out.push_str(suffix);
            out.push_str(" := ");
            render_entry(entry, Position::Top, &mut out);
        }
        out
    }
}

fn render_entry(entry: &PatternEntry, position: Position, out: &mut String) {
    match entry {
        PatternEntry::Pattern(Pattern::Symbol(name)) => out.push_str(name),
        PatternEntry::Pattern(Pattern::Terminal(terminal)) => render_terminal(terminal, out),
        PatternEntry::Patterns(group) => render_group(group, position, out),
    }
}

fn render_terminal(terminal: &Terminal, out: &mut String) {
    match terminal.comparison() {
        Comparison::Regexp => out.push_str(terminal.expression()),
        Comparison::Equals => {
            out.push('"');
            for ch in terminal.value().chars() {
                match ch {
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    '\r' => out.push_str("\\r"),
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    ch => out.push(ch),
                }
            }
            out.push('"');
        }
    }
}

fn render_group(group: &Patterns, position: Position, out: &mut String) {
    let (open, close) = match group.repeat() {
        Repeat::ZeroOrEmpty => ("[", "]"),
        Repeat::ZeroOrMore => ("(", ")*"),
        Repeat::OneOrMore => ("(", ")+"),
        Repeat::ZeroOrOne => ("(", ")?"),
        Repeat::NoRepeat => {
            let bare = match group.operator() {
                Operator::Or => position == Position::Top,
                Operator::And => group.len() >= 2 && position != Position::Item,
            };
            if bare {
                ("", "")
            } else {
                ("(", ")")
            }
        }
    };

    out.push_str(open);
    let (separator, inner) = match group.operator() {
        Operator::And => (" ", Position::Item),
        Operator::Or => (" | ", Position::Alternative),
    };
    for (index, entry) in group.entries().iter().enumerate() {
        if index > 0 {
            out.push_str(separator);
        }
        render_entry(entry, inner, out);
    }
    out.push_str(close);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(name: &str) -> PatternEntry {
        Pattern::symbol(name).into()
    }

    #[test]
    fn renders_every_shape() {
        let rules = Rules::new([
            ("entry", Patterns::and([symbol("line")]).repeated(Repeat::OneOrMore).into()),
            (
                "line",
                Patterns::and([
                    symbol("name"),
                    Patterns::and([Pattern::equals("[").into(), symbol("num"), Pattern::equals("]").into()])
                        .repeated(Repeat::ZeroOrEmpty)
                        .into(),
                    Pattern::equals("\n").into(),
                ])
                .into(),
            ),
            (
                "?value",
                Patterns::or([
                    Patterns::and([symbol("name"), symbol("num")]).into(),
                    Patterns::and([symbol("num")]).into(),
                    Patterns::or([symbol("name"), Pattern::equals("\"q\"").into()]).into(),
                ])
                .into(),
            ),
            ("*name", Pattern::regexp("[a-z]+").into()),
            ("num", Patterns::and([Pattern::regexp("[0-9]").into()]).repeated(Repeat::ZeroOrOne).into()),
        ])
        .unwrap();

        expect_test::expect![[r#"
            entry := (line)+
            line := name ["[" num "]"] "\n"
            value[1] := name num | (num) | (name | "\"q\"")
            name[*] := /[a-z]+/
            num := (/[0-9]/)?"#]]
        .assert_eq(&rules.pretty());
    }
}
