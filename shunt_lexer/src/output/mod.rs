//! Record and JSON-lines rendering
//!
//! A token record is `<LABEL>\t<escaped text>`. A triplet record is three
//! token records joined by `|`. Callers terminate each rendered line with
//! `\n`. Window slots padded by the fill policy render as `FILL\t`, so they
//! never collide with a real blank. Text escaping guarantees that TAB, `|` and line breaks only ever
//! appear as separators:
//!
//! | byte            | escaped as |
//! |-----------------|------------|
//! | `\`             | `\\`       |
//! | TAB             | `\t`       |
//! | LF              | `\n`       |
//! | CR              | `\r`       |
//! | `\|`            | `\|`       |
//! | other control or non-ASCII | `\xHH` |

use crate::tokens::{Token, TripletWindow};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

pub const FIELD_SEPARATOR: char = '\t';
pub const TRIPLET_SEPARATOR: char = '|';
pub const FILLER_LABEL: &str = "FILL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Records,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "records" | "record" => Ok(OutputFormat::Records),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Anything the CLI can print as one output line
pub trait Render: Serialize {
    fn to_record(&self) -> String;

    fn render(&self, format: OutputFormat) -> Result<String, OutputError> {
        match format {
            OutputFormat::Records => Ok(self.to_record()),
            OutputFormat::Json => Ok(serde_json::to_string(self)?),
        }
    }
}

impl Render for Token {
    fn to_record(&self) -> String {
        let label = if self.is_filler() {
            FILLER_LABEL
        } else {
            self.class().label()
        };
        format!(
            "{}{}{}",
            label,
            FIELD_SEPARATOR,
            escape_text(self.text())
        )
    }
}

impl Render for TripletWindow {
    fn to_record(&self) -> String {
        [&self.oldest, &self.middle, &self.newest]
            .iter()
            .map(|token| token.to_record())
            .collect::<Vec<_>>()
            .join(&TRIPLET_SEPARATOR.to_string())
    }
}

/// Escape token text so it never contains a separator
pub fn escape_text(text: &[u8]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for &byte in text {
        match byte {
            b'\\' => escaped.push_str("\\\\"),
            b'\t' => escaped.push_str("\\t"),
            b'\n' => escaped.push_str("\\n"),
            b'\r' => escaped.push_str("\\r"),
            b'|' => escaped.push_str("\\|"),
            0x20..=0x7E => escaped.push(byte as char),
            _ => {
                let _ = write!(escaped, "\\x{:02X}", byte);
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenClass;

    #[test]
    fn test_token_record() {
        let token = Token::new(TokenClass::Function, "foo");
        assert_eq!(token.to_record(), "FUNCT\tfoo");
        assert_eq!(Token::end_of_stream().to_record(), "EOS\t");
    }

    #[test]
    fn test_separators_are_escaped() {
        assert_eq!(escape_text(b"a|b\tc\nd\re\\f"), r"a\|b\tc\nd\re\\f");
        assert_eq!(escape_text(&[0x00, 0x7F, 0xC3]), r"\x00\x7F\xC3");
        assert_eq!(escape_text(b"plain text"), "plain text");
    }

    #[test]
    fn test_escaped_record_has_one_field_separator() {
        let token = Token::new(TokenClass::String, "tab\there|pipe\nline");
        let record = token.to_record();
        assert_eq!(record.matches(FIELD_SEPARATOR).count(), 1);
        assert!(!record.contains('\n'));
        assert!(!record.contains("e|p"));
    }

    #[test]
    fn test_triplet_record() {
        let window = TripletWindow::new(
            Token::new(TokenClass::Operand, "a"),
            Token::single(TokenClass::Operator, b'|'),
            Token::end_of_stream(),
        );
        assert_eq!(window.to_record(), "OPRND\ta|OPER\t\\||EOS\t");
        assert_eq!(window.to_record().matches(FIELD_SEPARATOR).count(), 3);
    }

    #[test]
    fn test_filler_has_its_own_label() {
        let window = TripletWindow::new(
            Token::filler(),
            Token::single(TokenClass::Blank, b' '),
            Token::end_of_stream(),
        );
        assert_eq!(window.to_record(), "FILL\t|BLANK\t |EOS\t");
        assert_ne!(
            Token::filler().to_record().trim_end(),
            Token::single(TokenClass::Blank, b' ').to_record().trim_end()
        );
    }

    #[test]
    fn test_non_utf8_strings_render_distinctly() {
        let lex_string = |input: &[u8]| {
            crate::lexical::tokenize_bytes(input).unwrap().tokens[0].clone()
        };
        let first = lex_string(&[b'\'', 0xC3, b'\'']);
        let second = lex_string(&[b'\'', 0xFF, b'\'']);
        assert_eq!(first.text(), &[0xC3]);

        let first_json = first.render(OutputFormat::Json).unwrap();
        let second_json = second.render(OutputFormat::Json).unwrap();
        assert_ne!(first_json, second_json);
        assert!(first_json.contains(r#""bytes":[195]"#));
        assert!(second_json.contains(r#""bytes":[255]"#));

        assert_eq!(first.render(OutputFormat::Records).unwrap(), "STRNG\t\\xC3");
    }

    #[test]
    fn test_json_rendering() {
        let token = Token::new(TokenClass::UnarySign, "-");
        assert_eq!(
            token.render(OutputFormat::Json).unwrap(),
            r#"{"class":"UnarySign","text":"-"}"#
        );

        let window = TripletWindow::new(
            Token::filler(),
            Token::filler(),
            Token::new(TokenClass::Operand, "x"),
        );
        let value: serde_json::Value =
            serde_json::from_str(&window.render(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(value["newest"]["text"], "x");
        assert_eq!(value["oldest"]["class"], "Blank");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("records".parse::<OutputFormat>(), Ok(OutputFormat::Records));
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::Records);
    }
}
