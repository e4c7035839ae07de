//! Classified tokens
//!
//! Token text is kept as raw bytes: the lexer works byte by byte and input
//! is not required to be valid UTF-8. Use [`Token::text_lossy`] for display.
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Closed set of token classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenClass {
    Operand,
    Function,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    BlockStart,
    BlockEnd,
    Dereference,
    String,
    Operator,
    /// The class itself marks the sign as unary; the text is the sign
    UnarySign,
    Blank,
    EndOfStream,
}

impl TokenClass {
    pub const ALL: [TokenClass; 14] = [
        TokenClass::Operand,
        TokenClass::Function,
        TokenClass::LeftBracket,
        TokenClass::RightBracket,
        TokenClass::Comma,
        TokenClass::Semicolon,
        TokenClass::BlockStart,
        TokenClass::BlockEnd,
        TokenClass::Dereference,
        TokenClass::String,
        TokenClass::Operator,
        TokenClass::UnarySign,
        TokenClass::Blank,
        TokenClass::EndOfStream,
    ];

    /// Record-format label
    pub fn label(&self) -> &'static str {
        match self {
            TokenClass::Operand => "OPRND",
            TokenClass::Function => "FUNCT",
            TokenClass::LeftBracket => "BRLFT",
            TokenClass::RightBracket => "BRGHT",
            TokenClass::Comma => "COMMA",
            TokenClass::Semicolon => "SEMICOLON",
            TokenClass::BlockStart => "BLKST",
            TokenClass::BlockEnd => "BLKEND",
            TokenClass::Dereference => "DEREF",
            TokenClass::String => "STRNG",
            TokenClass::Operator => "OPER",
            TokenClass::UnarySign => "UNARY",
            TokenClass::Blank => "BLANK",
            TokenClass::EndOfStream => "EOS",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Operand => "Operand",
            TokenClass::Function => "Function",
            TokenClass::LeftBracket => "LeftBracket",
            TokenClass::RightBracket => "RightBracket",
            TokenClass::Comma => "Comma",
            TokenClass::Semicolon => "Semicolon",
            TokenClass::BlockStart => "BlockStart",
            TokenClass::BlockEnd => "BlockEnd",
            TokenClass::Dereference => "Dereference",
            TokenClass::String => "String",
            TokenClass::Operator => "Operator",
            TokenClass::UnarySign => "UnarySign",
            TokenClass::Blank => "Blank",
            TokenClass::EndOfStream => "EndOfStream",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenClass {
    type Err = String;

    /// Accepts either the record label or the class name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenClass::ALL
            .iter()
            .copied()
            .find(|class| class.label() == s || class.as_str() == s)
            .ok_or_else(|| format!("Unknown token class: {}", s))
    }
}

/// A classified lexeme. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    class: TokenClass,
    text: Vec<u8>,
}

impl Token {
    pub fn new(class: TokenClass, text: impl Into<Vec<u8>>) -> Self {
        Self {
            class,
            text: text.into(),
        }
    }

    /// One-byte token such as punctuation, a blank or a single operator
    pub fn single(class: TokenClass, byte: u8) -> Self {
        Self {
            class,
            text: vec![byte],
        }
    }

    pub fn end_of_stream() -> Self {
        Self {
            class: TokenClass::EndOfStream,
            text: Vec::new(),
        }
    }

    /// Placeholder for window slots that precede the first token. A Blank
    /// with empty text never comes out of the lexer.
    pub fn filler() -> Self {
        Self {
            class: TokenClass::Blank,
            text: Vec::new(),
        }
    }

    pub fn class(&self) -> TokenClass {
        self.class
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.class == TokenClass::EndOfStream
    }

    pub fn is_filler(&self) -> bool {
        self.class == TokenClass::Blank && self.text.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.class, self.text_lossy())
    }
}

/// `text` is exact when the bytes are UTF-8. Otherwise it is the lossy
/// rendering and `bytes` carries the raw values.
impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(&self.text) {
            Ok(text) => {
                let mut state = serializer.serialize_struct("Token", 2)?;
                state.serialize_field("class", &self.class)?;
                state.serialize_field("text", text)?;
                state.end()
            }
            Err(_) => {
                let mut state = serializer.serialize_struct("Token", 3)?;
                state.serialize_field("class", &self.class)?;
                state.serialize_field("text", &self.text_lossy())?;
                state.serialize_field("bytes", &self.text)?;
                state.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<_> = TokenClass::ALL.iter().map(|c| c.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), TokenClass::ALL.len());
    }

    #[test]
    fn test_class_from_label_or_name() {
        assert_eq!("FUNCT".parse::<TokenClass>(), Ok(TokenClass::Function));
        assert_eq!("UnarySign".parse::<TokenClass>(), Ok(TokenClass::UnarySign));
        assert!("NOPE".parse::<TokenClass>().is_err());
    }

    #[test]
    fn test_end_of_stream_has_empty_text() {
        let eos = Token::end_of_stream();
        assert!(eos.is_end_of_stream());
        assert!(eos.text().is_empty());
    }

    #[test]
    fn test_filler_is_distinct_from_real_blank() {
        assert!(Token::filler().is_filler());
        assert!(!Token::single(TokenClass::Blank, b' ').is_filler());
        assert_ne!(Token::filler(), Token::single(TokenClass::Blank, b' '));
    }

    #[test]
    fn test_display_and_json() {
        let token = Token::new(TokenClass::Function, "foo");
        assert_eq!(token.to_string(), "Function(\"foo\")");

        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"class":"Function","text":"foo"}"#);
    }

    #[test]
    fn test_invalid_utf8_text_is_preserved() {
        let token = Token::new(TokenClass::Operator, vec![0xFFu8]);
        assert_eq!(token.text(), &[0xFF]);
        assert_eq!(token.text_lossy(), "\u{FFFD}");
    }

    #[test]
    fn test_json_keeps_raw_bytes_of_non_utf8_text() {
        let first = Token::new(TokenClass::String, vec![0xC3u8]);
        let second = Token::new(TokenClass::String, vec![0xFFu8]);

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        let value: serde_json::Value = serde_json::from_str(&first_json).unwrap();
        assert_eq!(value["text"], "\u{FFFD}");
        assert_eq!(value["bytes"], serde_json::json!([195]));
        assert_ne!(first_json, second_json);

        let utf8 = serde_json::to_string(&Token::new(TokenClass::String, "é")).unwrap();
        assert_eq!(utf8, r#"{"class":"String","text":"é"}"#);
    }
}
