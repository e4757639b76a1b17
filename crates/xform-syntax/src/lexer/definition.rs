//! Tokenizer configuration.
//!
//! A [`TokenDefinition`] describes the character classes, delimiter pairs
//! and operator table the [`Tokenizer`](super::Tokenizer) scans with. Every
//! field falls back to its default, so a TOML document only needs to list
//! what it overrides:
//!
//! ```toml
//! analyze_order = ["white_space", "symbol", "number", "identifier"]
//! symbol = "()+-"
//! operators = ["->"]
//! ```

use serde::Deserialize;
use thiserror::Error;

use super::TokenDomain;

/// Error raised when a token definition cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be deserialized.
    #[error("invalid token definition: {0}")]
    Toml(#[from] toml::de::Error),
}

/// An opening and closing delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuotePair {
    /// Opening delimiter, including any prefix such as `r"`.
    pub open: String,
    /// Closing delimiter.
    pub close: String,
}

impl QuotePair {
    /// Creates a delimiter pair.
    #[must_use]
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// Character classes and tables driving the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenDefinition {
    /// Domains in the order they are tried at each position.
    pub analyze_order: Vec<TokenDomain>,
    /// Whitespace characters.
    pub white_space: String,
    /// Comment delimiters.
    pub comment: Vec<QuotePair>,
    /// Quote delimiters, tried in order.
    pub quote: Vec<QuotePair>,
    /// Characters that start and continue a number.
    pub number: String,
    /// Characters that start and continue a name.
    pub identifier: String,
    /// Single-character symbols.
    pub symbol: String,
    /// Multi-character operators, matched before single symbols.
    pub operators: Vec<String>,
}

impl Default for TokenDefinition {
    fn default() -> Self {
        let quote = ["", "r", "f"]
            .iter()
            .flat_map(|prefix| {
                ["\"\"\"", "'", "\""]
                    .iter()
                    .map(move |quote| QuotePair::new(format!("{prefix}{quote}"), *quote))
            })
            .collect();

        Self {
            analyze_order: vec![
                TokenDomain::WhiteSpace,
                TokenDomain::Comment,
                TokenDomain::Symbol,
                TokenDomain::Quote,
                TokenDomain::Number,
                TokenDomain::Identifier,
            ],
            white_space: " \t\u{c}\n\r".to_string(),
            comment: vec![QuotePair::new("#", "\n")],
            quote,
            number: "0123456789.".to_string(),
            identifier: "_0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ"
                .to_string(),
            symbol: "@#$.,:;(){}[]`=-+*/%&|^~!?<>".to_string(),
            operators: [
                "-=", "+=", "*=", "/=", "%=", "&=", "|=", "^=", "~=", "==", "!=", "<=", ">=",
                "&&", "||", "<<", ">>", "->", "**", ":=", "...",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

impl TokenDefinition {
    /// Parses a definition from TOML, filling missing keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed or a key
    /// has the wrong type.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let definition: Self = toml::from_str(contents)?;
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_quotes_cover_prefixes() {
        let definition = TokenDefinition::default();
        assert_eq!(definition.quote.len(), 9);
        assert_eq!(definition.quote[0], QuotePair::new("\"\"\"", "\"\"\""));
        assert_eq!(definition.quote[4], QuotePair::new("r'", "'"));
    }

    #[test]
    fn toml_overrides_only_listed_keys() {
        let definition = TokenDefinition::from_toml(
            r#"
analyze_order = ["white_space", "symbol", "identifier"]
symbol = "()"

[[comment]]
open = "//"
close = "\n"
"#,
        )
        .unwrap();

        assert_eq!(
            definition.analyze_order,
            vec![
                TokenDomain::WhiteSpace,
                TokenDomain::Symbol,
                TokenDomain::Identifier
            ]
        );
        assert_eq!(definition.symbol, "()");
        assert_eq!(definition.comment, vec![QuotePair::new("//", "\n")]);
        assert_eq!(definition.number, TokenDefinition::default().number);
    }

    #[test]
    fn toml_rejects_unknown_domain() {
        let err = TokenDefinition::from_toml(r#"analyze_order = ["emoji"]"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid token definition"));
    }
}
