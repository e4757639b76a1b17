//! Source-located diagnostics for failed parses.
//!
//! The parser walks tokens back to front, so progress is counted from the
//! end of the stream: after `consumed` tokens the offending token is the one
//! just before the consumed suffix.

use std::fmt;

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::lexer::{text_range, Token};

/// A rendered parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line of the offending token.
    pub line: usize,
    /// 1-based column of the offending token, in characters.
    pub column: usize,
    /// Tokens consumed from the end of the stream.
    pub consumed: usize,
    /// Total number of tokens.
    pub total: usize,
    /// Text of the offending token; empty at the start of input.
    pub token: SmolStr,
    /// Byte range of the offending token.
    pub range: TextRange,
    /// Progress line, quoted source line and caret underline.
    pub summary: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

/// Locates the token a failed parse stopped at.
#[derive(Debug, Clone, Copy)]
pub struct ErrorCollector<'a> {
    source: &'a str,
    tokens: &'a [Token],
    consumed: usize,
}

impl<'a> ErrorCollector<'a> {
    /// Creates a collector for a parse that consumed `consumed` tokens from
    /// the end of `tokens`.
    #[must_use]
    pub fn new(source: &'a str, tokens: &'a [Token], consumed: usize) -> Self {
        Self {
            source,
            tokens,
            consumed,
        }
    }

    /// Returns the offending token, or `None` when every token was consumed.
    #[must_use]
    pub fn cause(&self) -> Option<&'a Token> {
        let remain = self.tokens.len().checked_sub(self.consumed)?;
        remain.checked_sub(1).and_then(|index| self.tokens.get(index))
    }

    /// Builds the diagnostic.
    #[must_use]
    pub fn diagnostic(&self) -> Diagnostic {
        let (token, range) = match self.cause() {
            Some(token) => (token.text.clone(), token.range),
            None => (SmolStr::default(), TextRange::empty(TextSize::from(0))),
        };

        let start = clamp_to_boundary(self.source, usize::from(range.start()));
        let line_start = self.source[..start].rfind('\n').map_or(0, |index| index + 1);
        let line_end = self.source[start..]
            .find('\n')
            .map_or(self.source.len(), |index| start + index);
        let line_text = self.source[line_start..line_end].trim_end_matches('\r');

        let line = self.source[..line_start].matches('\n').count() + 1;
        let column = self.source[line_start..start].chars().count();
        let end = clamp_to_boundary(self.source, usize::from(range.end())).clamp(start, line_end);
        let width = self.source[start..end].chars().count().max(1);

        let progress = format!(
            "consumed: {}/{}, token: {:?}",
            self.consumed,
            self.tokens.len(),
            token.as_str()
        );
        let quote = format!("({line}) >>> ");
        let summary = format!(
            "{progress}\n{quote}{line_text}\n{}{}",
            " ".repeat(quote.len() + column),
            "^".repeat(width)
        );

        Diagnostic {
            line,
            column: column + 1,
            consumed: self.consumed,
            total: self.tokens.len(),
            token,
            range: text_range(start, end),
            summary,
        }
    }

    /// Renders the diagnostic summary.
    #[must_use]
    pub fn summary(&self) -> String {
        self.diagnostic().summary
    }
}

fn clamp_to_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
