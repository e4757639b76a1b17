//! Lexer for grammar descriptions.
//!
//! Grammar text has a small fixed vocabulary, so it is lexed with `logos`
//! instead of the configurable [`Tokenizer`](super::Tokenizer).

use logos::Logos;

use super::{text_range, Token, TokenKind, Tokenize, TokenizeError};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum GrammarToken {
    #[regex(r"[ \t\r\x0C]+")]
    WhiteSpace,

    #[token("\n")]
    LineBreak,

    #[regex(r"#[^\n]*", allow_greedy = true)]
    Comment,

    #[regex(r"[a-zA-Z_][0-9a-zA-Z_]*")]
    Name,

    #[regex(r"[0-9]+")]
    Digit,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r"/([^/\n\\\[]|\\.|\[[^\]\n]*\])+/")]
    Regexp,

    #[token(":=")]
    Define,

    #[token("|")]
    Or,

    #[token("[")]
    BracketL,

    #[token("]")]
    BracketR,

    #[token("(")]
    ParenL,

    #[token(")")]
    ParenR,

    #[token("*")]
    Aster,

    #[token("+")]
    Plus,

    #[token("?")]
    Question,
}

impl GrammarToken {
    fn kind(self) -> TokenKind {
        match self {
            Self::WhiteSpace => TokenKind::WhiteSpace,
            Self::LineBreak => TokenKind::LineBreak,
            Self::Comment => TokenKind::Comment,
            Self::Name => TokenKind::Name,
            Self::Digit => TokenKind::Digit,
            Self::String => TokenKind::String,
            Self::Regexp => TokenKind::Regexp,
            Self::Define => TokenKind::WalrusEqual,
            Self::Or => TokenKind::Or,
            Self::BracketL => TokenKind::BracketL,
            Self::BracketR => TokenKind::BracketR,
            Self::ParenL => TokenKind::ParenL,
            Self::ParenR => TokenKind::ParenR,
            Self::Aster => TokenKind::Aster,
            Self::Plus => TokenKind::Plus,
            Self::Question => TokenKind::Question,
        }
    }
}

/// Tokenizer for grammar descriptions.
///
/// Every rule ends in a `"\n"` token: runs of line breaks collapse into one,
/// leading line breaks are dropped, and a missing final line break is added.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrammarLexer;

impl GrammarLexer {
    /// Creates a grammar lexer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Tokenize for GrammarLexer {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>, TokenizeError> {
        let mut lexer = GrammarToken::lexer(source);
        let mut tokens: Vec<Token> = Vec::new();
        while let Some(result) = lexer.next() {
            let span = lexer.span();
            let Ok(token) = result else {
                let ch = lexer.slice().chars().next().unwrap_or_default();
                return Err(TokenizeError::UnknownCharacter {
                    ch,
                    offset: span.start,
                });
            };

            let range = text_range(span.start, span.end);
            match token {
                GrammarToken::WhiteSpace | GrammarToken::Comment => {}
                GrammarToken::LineBreak => {
                    if tokens.last().is_some_and(|last| last.kind != TokenKind::NewLine) {
                        tokens.push(Token::new(TokenKind::NewLine, "\n", range));
                    }
                }
                token => tokens.push(Token::new(token.kind(), lexer.slice(), range)),
            }
        }

        if tokens.last().is_some_and(|last| last.kind != TokenKind::NewLine) {
            let end = source.len();
            tokens.push(Token::new(TokenKind::NewLine, "\n", text_range(end, end)));
        }

        Ok(tokens)
    }
}
