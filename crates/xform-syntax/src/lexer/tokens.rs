//! Token kinds and domains.
//!
//! Every kind carries its domain in the high nibble of its discriminant,
//! so `TokenKind::domain` is a shift rather than a lookup table.

use serde::{Deserialize, Serialize};

/// Coarse lexical category of a token.
///
/// The tokenizer tries domains in the configured order and lets the first
/// matching one scan the next token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenDomain {
    /// Spaces, tabs and line breaks.
    WhiteSpace,
    /// Comments delimited by a configured pair.
    Comment,
    /// Quoted string and regex literals.
    Quote,
    /// Digits and decimals.
    Number,
    /// Names.
    Identifier,
    /// Single symbol characters and multi-character operators.
    Symbol,
    /// Kinds outside the scanned domains.
    Unknown,
}

/// All token kinds produced by the tokenizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum TokenKind {
    // =========================================================================
    // WHITESPACE
    // =========================================================================
    /// Whitespace without a line break
    #[default]
    WhiteSpace = 0x00,
    /// Whitespace containing at least one line break
    LineBreak = 0x01,
    /// Statement terminator (`\n`) produced by the rebuild pass
    NewLine = 0x02,
    /// Start of an indented block, produced by the rebuild pass
    Indent = 0x03,
    /// End of an indented block, produced by the rebuild pass
    Dedent = 0x04,

    // =========================================================================
    // COMMENT
    // =========================================================================
    /// Comment, delimiters included
    Comment = 0x10,

    // =========================================================================
    // QUOTE
    // =========================================================================
    /// String literal, quotes and prefix included
    String = 0x20,
    /// Regex literal (`/.../`)
    Regexp = 0x21,

    // =========================================================================
    // NUMBER
    // =========================================================================
    /// Integer literal
    Digit = 0x30,
    /// Number containing a `.`
    Decimal = 0x31,

    // =========================================================================
    // IDENTIFIER
    // =========================================================================
    /// Identifier
    Name = 0x40,

    // =========================================================================
    // SYMBOLS
    // =========================================================================
    /// `@`
    At = 0x50,
    /// `#`
    Sharp = 0x51,
    /// `$`
    Dollar = 0x52,
    /// `.`
    Dot = 0x53,
    /// `,`
    Comma = 0x54,
    /// `:`
    Colon = 0x55,
    /// `;`
    SemiColon = 0x56,
    /// `(`
    ParenL = 0x57,
    /// `)`
    ParenR = 0x58,
    /// `{`
    BraceL = 0x59,
    /// `}`
    BraceR = 0x5A,
    /// `[`
    BracketL = 0x5B,
    /// `]`
    BracketR = 0x5C,
    /// `` ` ``
    BackQuote = 0x5D,
    /// `=`
    Equal = 0x5E,
    /// `-`
    Minus = 0x5F,
    /// `+`
    Plus = 0x60,
    /// `*`
    Aster = 0x61,
    /// `/`
    Slash = 0x62,
    /// `%`
    Percent = 0x63,
    /// `&`
    And = 0x64,
    /// `|`
    Or = 0x65,
    /// `^`
    Hat = 0x66,
    /// `~`
    Tilde = 0x67,
    /// `!`
    Exclamation = 0x68,
    /// `?`
    Question = 0x69,
    /// `<`
    Less = 0x6A,
    /// `>`
    Greater = 0x6B,
    /// Configured symbol without a dedicated kind
    Symbol = 0x6F,

    // =========================================================================
    // OPERATORS (multi-character symbols)
    // =========================================================================
    /// `-=`
    MinusEqual = 0x70,
    /// `+=`
    PlusEqual = 0x71,
    /// `*=`
    AsterEqual = 0x72,
    /// `/=`
    SlashEqual = 0x73,
    /// `%=`
    PercentEqual = 0x74,
    /// `&=`
    AndEqual = 0x75,
    /// `|=`
    OrEqual = 0x76,
    /// `^=`
    HatEqual = 0x77,
    /// `~=`
    TildeEqual = 0x78,
    /// `==`
    DoubleEqual = 0x79,
    /// `!=`
    NotEqual = 0x7A,
    /// `<=`
    LessEqual = 0x7B,
    /// `>=`
    GreaterEqual = 0x7C,
    /// `&&`
    DoubleAnd = 0x7D,
    /// `||`
    DoubleOr = 0x7E,
    /// `<<`
    ShiftL = 0x7F,
    /// `>>`
    ShiftR = 0x80,
    /// `->`
    Arrow = 0x81,
    /// `**`
    DoubleAster = 0x82,
    /// `:=`
    WalrusEqual = 0x83,
    /// `...`
    Ellipsis = 0x84,
    /// Configured operator without a dedicated kind
    Operator = 0x8F,

    // =========================================================================
    // SPECIAL
    // =========================================================================
    /// Placeholder token backing the empty AST leaf
    Empty = 0xFE,
}

impl TokenKind {
    /// Returns the domain encoded in the high nibble of the kind.
    #[must_use]
    pub fn domain(self) -> TokenDomain {
        match (self as u8) >> 4 {
            0x0 => TokenDomain::WhiteSpace,
            0x1 => TokenDomain::Comment,
            0x2 => TokenDomain::Quote,
            0x3 => TokenDomain::Number,
            0x4 => TokenDomain::Identifier,
            0x5..=0x8 => TokenDomain::Symbol,
            _ => TokenDomain::Unknown,
        }
    }

    /// Returns true if this token carries no meaning for the parser.
    #[must_use]
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WhiteSpace | Self::LineBreak | Self::Comment)
    }

    /// Returns true if this token opens a bracket pair.
    #[must_use]
    pub fn is_enclosure_open(self) -> bool {
        matches!(self, Self::ParenL | Self::BraceL | Self::BracketL)
    }

    /// Returns true if this token closes a bracket pair.
    #[must_use]
    pub fn is_enclosure_close(self) -> bool {
        matches!(self, Self::ParenR | Self::BraceR | Self::BracketR)
    }

    /// Returns the kind of a single symbol character.
    #[must_use]
    pub fn from_symbol(ch: char) -> Self {
        match ch {
            '@' => Self::At,
            '#' => Self::Sharp,
            '$' => Self::Dollar,
            '.' => Self::Dot,
            ',' => Self::Comma,
            ':' => Self::Colon,
            ';' => Self::SemiColon,
            '(' => Self::ParenL,
            ')' => Self::ParenR,
            '{' => Self::BraceL,
            '}' => Self::BraceR,
            '[' => Self::BracketL,
            ']' => Self::BracketR,
            '`' => Self::BackQuote,
            '=' => Self::Equal,
            '-' => Self::Minus,
            '+' => Self::Plus,
            '*' => Self::Aster,
            '/' => Self::Slash,
            '%' => Self::Percent,
            '&' => Self::And,
            '|' => Self::Or,
            '^' => Self::Hat,
            '~' => Self::Tilde,
            '!' => Self::Exclamation,
            '?' => Self::Question,
            '<' => Self::Less,
            '>' => Self::Greater,
            _ => Self::Symbol,
        }
    }

    /// Returns the kind of a multi-character operator.
    #[must_use]
    pub fn from_operator(text: &str) -> Self {
        match text {
            "-=" => Self::MinusEqual,
            "+=" => Self::PlusEqual,
            "*=" => Self::AsterEqual,
            "/=" => Self::SlashEqual,
            "%=" => Self::PercentEqual,
            "&=" => Self::AndEqual,
            "|=" => Self::OrEqual,
            "^=" => Self::HatEqual,
            "~=" => Self::TildeEqual,
            "==" => Self::DoubleEqual,
            "!=" => Self::NotEqual,
            "<=" => Self::LessEqual,
            ">=" => Self::GreaterEqual,
            "&&" => Self::DoubleAnd,
            "||" => Self::DoubleOr,
            "<<" => Self::ShiftL,
            ">>" => Self::ShiftR,
            "->" => Self::Arrow,
            "**" => Self::DoubleAster,
            ":=" => Self::WalrusEqual,
            "..." => Self::Ellipsis,
            _ => Self::Operator,
        }
    }
}
