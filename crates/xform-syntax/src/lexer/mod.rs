//! Tokenizers for source text and grammar descriptions.
//!
//! Two tokenizers implement [`Tokenize`]:
//!
//! - [`Tokenizer`] scans source text with the configurable domain scanners of
//!   a [`TokenDefinition`], then rebuilds the raw stream into the significant
//!   tokens the parser consumes.
//! - [`GrammarLexer`] is a fixed `logos` lexer for grammar descriptions.

mod definition;
mod grammar;
mod tokens;

pub use definition::{ConfigError, QuotePair, TokenDefinition};
pub use grammar::GrammarLexer;
pub use tokens::{TokenDomain, TokenKind};

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use thiserror::Error;

/// Text of the [`TokenKind::Indent`] token.
pub const INDENT_TEXT: &str = "\\INDENT";
/// Text of the [`TokenKind::Dedent`] token.
pub const DEDENT_TEXT: &str = "\\DEDENT";

/// A token produced by a tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The text the parser compares against.
    pub text: SmolStr,
    /// The byte range of the token in the source text.
    pub range: TextRange,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<SmolStr>, range: TextRange) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
        }
    }

    /// The placeholder token carried by the empty AST leaf.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(TokenKind::Empty, "", TextRange::empty(TextSize::from(0)))
    }

    /// Returns the domain of the token's kind.
    #[must_use]
    pub fn domain(&self) -> TokenDomain {
        self.kind.domain()
    }

    /// Returns the token text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the length of the token in bytes.
    #[must_use]
    pub fn len(&self) -> TextSize {
        self.range.len()
    }

    /// Returns true if the token covers no source text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Error raised while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// No configured domain accepts the character.
    #[error("no token domain matches {ch:?} at offset {offset}")]
    UnknownCharacter {
        /// The rejected character.
        ch: char,
        /// Byte offset of the character.
        offset: usize,
    },
}

/// Splits source text into the tokens a parser consumes.
pub trait Tokenize {
    /// Tokenizes `source` into significant tokens.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizeError::UnknownCharacter`] if a character belongs to
    /// no domain.
    fn tokenize(&self, source: &str) -> Result<Vec<Token>, TokenizeError>;
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn text_range(start: usize, end: usize) -> TextRange {
    TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32))
}

/// Domain-prioritized tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    definition: TokenDefinition,
    /// Operators sorted longest first.
    operators: Vec<String>,
}

impl Tokenizer {
    /// Creates a tokenizer with the default definition.
    #[must_use]
    pub fn new() -> Self {
        Self::with_definition(TokenDefinition::default())
    }

    /// Creates a tokenizer for a custom definition.
    #[must_use]
    pub fn with_definition(definition: TokenDefinition) -> Self {
        let mut operators: Vec<String> = definition
            .operators
            .iter()
            .filter(|operator| !operator.is_empty())
            .cloned()
            .collect();
        operators.sort_by(|a, b| b.len().cmp(&a.len()));
        Self {
            definition,
            operators,
        }
    }

    /// Returns the definition this tokenizer scans with.
    #[must_use]
    pub fn definition(&self) -> &TokenDefinition {
        &self.definition
    }

    /// Splits `source` into raw tokens, whitespace and comments included.
    ///
    /// Concatenating the text of the returned tokens reproduces `source`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizeError::UnknownCharacter`] if no domain matches.
    pub fn lex(&self, source: &str) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();
        let mut offset = 0;
        while let Some(ch) = source[offset..].chars().next() {
            let rest = &source[offset..];
            let domain = self
                .analyze_domain(rest, ch)
                .ok_or(TokenizeError::UnknownCharacter { ch, offset })?;
            let (kind, len) = self.scan(domain, rest, ch);
            let end = offset + len;
            tokens.push(Token::new(kind, &source[offset..end], text_range(offset, end)));
            offset = end;
        }

        Ok(tokens)
    }

    fn analyze_domain(&self, rest: &str, ch: char) -> Option<TokenDomain> {
        let definition = &self.definition;
        let opens = |pairs: &[QuotePair]| {
            pairs
                .iter()
                .any(|pair| !pair.open.is_empty() && rest.starts_with(pair.open.as_str()))
        };

        definition
            .analyze_order
            .iter()
            .copied()
            .find(|domain| match domain {
                TokenDomain::WhiteSpace => definition.white_space.contains(ch),
                TokenDomain::Comment => opens(&definition.comment),
                TokenDomain::Quote => opens(&definition.quote),
                TokenDomain::Number => definition.number.contains(ch),
                TokenDomain::Identifier => definition.identifier.contains(ch),
                TokenDomain::Symbol => definition.symbol.contains(ch),
                TokenDomain::Unknown => false,
            })
    }

    /// Scans one token of `domain` at the start of `rest`, returning its kind
    /// and byte length. The length is never zero.
    fn scan(&self, domain: TokenDomain, rest: &str, ch: char) -> (TokenKind, usize) {
        let definition = &self.definition;
        match domain {
            TokenDomain::WhiteSpace => {
                let len = scan_while(rest, &definition.white_space);
                let kind = if rest[..len].contains('\n') {
                    TokenKind::LineBreak
                } else {
                    TokenKind::WhiteSpace
                };
                (kind, len)
            }
            TokenDomain::Comment => (TokenKind::Comment, scan_comment(rest, &definition.comment)),
            TokenDomain::Quote => {
                let len = scan_quote(rest, &definition.quote);
                let kind = if rest.starts_with('/') {
                    TokenKind::Regexp
                } else {
                    TokenKind::String
                };
                (kind, len)
            }
            TokenDomain::Number => {
                let len = scan_while(rest, &definition.number);
                let kind = if rest[..len].contains('.') {
                    TokenKind::Decimal
                } else {
                    TokenKind::Digit
                };
                (kind, len)
            }
            TokenDomain::Identifier => (TokenKind::Name, scan_while(rest, &definition.identifier)),
            TokenDomain::Symbol => self
                .operators
                .iter()
                .find(|operator| rest.starts_with(operator.as_str()))
                .map_or((TokenKind::from_symbol(ch), ch.len_utf8()), |operator| {
                    (TokenKind::from_operator(operator), operator.len())
                }),
            TokenDomain::Unknown => (TokenKind::Symbol, ch.len_utf8()),
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenize for Tokenizer {
    /// Lexes `source` and keeps only what the parser needs.
    ///
    /// Whitespace and comments are dropped. Line breaks become a single
    /// [`TokenKind::NewLine`] token, except inside brackets and before the
    /// first significant token. A line indented deeper than the open block
    /// starts with [`TokenKind::Indent`]; a shallower one starts with a
    /// [`TokenKind::Dedent`] per closed block. Blocks still open at the end
    /// are closed after a final `NewLine`.
    fn tokenize(&self, source: &str) -> Result<Vec<Token>, TokenizeError> {
        let raw = self.lex(source)?;
        Ok(rebuild(raw))
    }
}

fn rebuild(raw: Vec<Token>) -> Vec<Token> {
    let end = raw.last().map_or(TextSize::from(0), |token| token.range.end());
    let mut enclosure = 0usize;
    // Open block widths, innermost last. The first line sets the base.
    let mut widths = vec![leading_indent(&raw)];
    // Indentation of the line after the last emitted `NewLine`.
    let mut pending = None;
    let mut tokens: Vec<Token> = Vec::with_capacity(raw.len());
    for token in raw {
        match token.kind {
            TokenKind::LineBreak | TokenKind::NewLine => {
                if enclosure > 0 {
                    continue;
                }
                if tokens.last().is_some_and(|last| last.kind != TokenKind::NewLine) {
                    tokens.push(Token::new(TokenKind::NewLine, "\n", token.range));
                }
                if !tokens.is_empty() {
                    pending = Some(line_indent(&token.text));
                }
            }
            kind if kind.is_trivia() => {}
            kind => {
                if let Some(width) = pending.take() {
                    open_or_close_blocks(&mut widths, width, token.range.start(), &mut tokens);
                }
                if kind.is_enclosure_open() {
                    enclosure += 1;
                } else if kind.is_enclosure_close() {
                    enclosure = enclosure.saturating_sub(1);
                }
                tokens.push(token);
            }
        }
    }

    if widths.len() > 1 {
        let range = TextRange::empty(end);
        if tokens.last().is_some_and(|last| last.kind != TokenKind::NewLine) {
            tokens.push(Token::new(TokenKind::NewLine, "\n", range));
        }
        for _ in 1..widths.len() {
            tokens.push(Token::new(TokenKind::Dedent, DEDENT_TEXT, range));
        }
    }

    tokens
}

/// Emits the block tokens for a line indented by `width`.
fn open_or_close_blocks(
    widths: &mut Vec<usize>,
    width: usize,
    at: TextSize,
    tokens: &mut Vec<Token>,
) {
    let range = TextRange::empty(at);
    while widths.len() > 1 && widths.last().is_some_and(|&open| open > width) {
        widths.pop();
        tokens.push(Token::new(TokenKind::Dedent, DEDENT_TEXT, range));
    }
    if widths.last().is_some_and(|&open| open < width) {
        widths.push(width);
        tokens.push(Token::new(TokenKind::Indent, INDENT_TEXT, range));
    }
}

/// Width of the last line of a line-break run.
fn line_indent(text: &str) -> usize {
    text.rsplit_once('\n').map_or(0, |(_, line)| line.chars().count())
}

/// Indentation of the first significant line.
fn leading_indent(raw: &[Token]) -> usize {
    raw.iter()
        .take_while(|token| token.kind.is_trivia())
        .fold(0, |width, token| match token.text.rsplit_once('\n') {
            Some((_, line)) => line.chars().count(),
            None => width + token.text.chars().count(),
        })
}

fn scan_while(rest: &str, set: &str) -> usize {
    rest.find(|ch: char| !set.contains(ch))
        .unwrap_or(rest.len())
}

fn scan_comment(rest: &str, pairs: &[QuotePair]) -> usize {
    let Some(pair) = pairs
        .iter()
        .find(|pair| !pair.open.is_empty() && rest.starts_with(pair.open.as_str()))
    else {
        return rest.len();
    };

    let body = pair.open.len();
    match rest[body..].find(pair.close.as_str()) {
        // A line-break terminator belongs to the following whitespace.
        Some(index) if pair.close == "\n" => body + index,
        Some(index) => body + index + pair.close.len(),
        None => rest.len(),
    }
}

fn scan_quote(rest: &str, pairs: &[QuotePair]) -> usize {
    let Some(pair) = pairs
        .iter()
        .find(|pair| !pair.open.is_empty() && rest.starts_with(pair.open.as_str()))
    else {
        return rest.len();
    };

    let body = pair.open.len();
    let mut from = body;
    loop {
        let Some(index) = rest[from..].find(pair.close.as_str()).map(|i| from + i) else {
            return rest.len();
        };
        // An odd run of backslashes escapes the close delimiter.
        let backslashes = rest.as_bytes()[body..index]
            .iter()
            .rev()
            .take_while(|&&byte| byte == b'\\')
            .count();
        let end = index + pair.close.len();
        if backslashes % 2 == 0 || pair.close.is_empty() {
            return end;
        }
        from = end;
    }
}

/// Lex `source` with the default definition.
///
/// # Errors
///
/// Returns [`TokenizeError::UnknownCharacter`] if no domain matches.
pub fn lex(source: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new().lex(source)
}

/// Tokenize `source` with the default definition.
///
/// # Errors
///
/// Returns [`TokenizeError::UnknownCharacter`] if no domain matches.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new().tokenize(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::text).collect()
    }

    #[test]
    fn lex_is_lossless() {
        let source = "a = 'x'  # note\n\tb += 1.5\n";
        let tokens = lex(source).unwrap();
        let joined: String = tokens.iter().map(Token::text).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn lex_preserves_positions() {
        let tokens = lex("abc := 12").unwrap();
        assert_eq!(tokens[0].range, TextRange::new(0.into(), 3.into()));
        assert_eq!(tokens[2].range, TextRange::new(4.into(), 6.into()));
        assert_eq!(tokens[2].kind, TokenKind::WalrusEqual);
        assert_eq!(tokens[4].kind, TokenKind::Digit);
    }

    #[test]
    fn operators_prefer_longest() {
        let tokens = tokenize("a ... b ** c -> d").unwrap();
        assert_eq!(texts(&tokens), vec!["a", "...", "b", "**", "c", "->", "d"]);
        assert_eq!(tokens[1].kind, TokenKind::Ellipsis);
    }

    #[test]
    fn quote_honors_escapes() {
        let tokens = tokenize(r#"s = "a\"b" + r'c'"#).unwrap();
        assert_eq!(texts(&tokens), vec!["s", "=", r#""a\"b""#, "+", "r'c'"]);
        assert_eq!(tokens[2].kind, TokenKind::String);
    }

    #[test]
    fn escaped_backslash_does_not_escape_the_close() {
        let tokens = tokenize(r#"s = "a\\" + "b\\\"c""#).unwrap();
        assert_eq!(texts(&tokens), vec!["s", "=", r#""a\\""#, "+", r#""b\\\"c""#]);
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        let tokens = tokenize("x = 'open").unwrap();
        assert_eq!(texts(&tokens), vec!["x", "=", "'open"]);
    }

    #[test]
    fn line_breaks_collapse_to_new_line() {
        let tokens = tokenize("\n\na\n# c\n\nb\n").unwrap();
        assert_eq!(texts(&tokens), vec!["a", "\n", "b", "\n"]);
        assert_eq!(tokens[1].kind, TokenKind::NewLine);
    }

    #[test]
    fn line_breaks_inside_brackets_are_dropped() {
        let tokens = tokenize("f(a,\n  b)\n").unwrap();
        assert_eq!(texts(&tokens), vec!["f", "(", "a", ",", "b", ")", "\n"]);
    }

    #[test]
    fn indentation_opens_and_closes_blocks() {
        let tokens = tokenize("if x:\n    y = 1\n    if z:\n        w\nv\n").unwrap();
        assert_eq!(
            texts(&tokens),
            vec![
                "if", "x", ":", "\n", INDENT_TEXT, "y", "=", "1", "\n", "if", "z", ":", "\n",
                INDENT_TEXT, "w", "\n", DEDENT_TEXT, DEDENT_TEXT, "v", "\n",
            ]
        );
        assert_eq!(tokens[4].kind, TokenKind::Indent);
        assert_eq!(tokens[4].range, TextRange::empty(10.into()));
        assert_eq!(tokens[16].kind, TokenKind::Dedent);
    }

    #[test]
    fn open_blocks_close_at_end_of_input() {
        let source = "def f():\n  return";
        let tokens = tokenize(source).unwrap();
        assert_eq!(
            texts(&tokens),
            vec!["def", "f", "(", ")", ":", "\n", INDENT_TEXT, "return", "\n", DEDENT_TEXT]
        );
        let end = TextRange::empty(TextSize::of(source));
        assert_eq!((tokens[8].range, tokens[9].range), (end, end));
    }

    #[test]
    fn first_line_sets_the_base_indentation() {
        let tokens = tokenize("  a\n  b\n    # note\n  c").unwrap();
        assert_eq!(texts(&tokens), vec!["a", "\n", "b", "\n", "c"]);
    }

    #[test]
    fn unknown_character_is_reported() {
        let err = lex("a ☃").unwrap_err();
        assert_eq!(err, TokenizeError::UnknownCharacter { ch: '☃', offset: 2 });
    }
}
