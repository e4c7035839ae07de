//! Lexical analysis
//!
//! [`LexerStateMachine`] turns character frames into classified tokens. The
//! concurrent lexer stage drives it from a channel; [`tokenize_bytes`] drives
//! it over an in-memory buffer with the same semantics.

pub mod analyzer;
pub mod classify;
pub mod error;

use crate::config::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::logging::codes;
use crate::tokens::{CharEvent, CharFrame, Lookahead, Token};
use serde::Serialize;

pub use analyzer::{LexerStateMachine, LexicalMetrics};
pub use classify::{classify, CharClass};
pub use error::{DataErrorKind, LexDiagnostic, LexerError};

/// Everything a complete lexing pass produced
#[derive(Debug, Clone, Serialize)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<LexDiagnostic>,
    pub metrics: LexicalMetrics,
}

impl LexOutput {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Character events for an in-memory buffer: one frame per byte, then END
pub fn char_events(input: &[u8]) -> impl Iterator<Item = CharEvent> + '_ {
    input
        .iter()
        .enumerate()
        .map(move |(i, &current)| {
            CharEvent::Frame(CharFrame::new(
                current,
                Lookahead::from(input.get(i + 1).copied()),
            ))
        })
        .chain(std::iter::once(CharEvent::End))
}

/// Tokenize a complete buffer with default preferences
pub fn tokenize_bytes(input: &[u8]) -> Result<LexOutput, LexerError> {
    tokenize_bytes_with_preferences(input, LexicalPreferences::default())
}

pub fn tokenize_bytes_with_preferences(
    input: &[u8],
    preferences: LexicalPreferences,
) -> Result<LexOutput, LexerError> {
    let mut machine = LexerStateMachine::with_preferences(preferences);
    let mut tokens = Vec::new();

    for event in char_events(input) {
        machine.feed(event, &mut tokens)?;
    }

    let diagnostics = machine.take_diagnostics();
    Ok(LexOutput {
        tokens,
        diagnostics,
        metrics: machine.into_metrics(),
    })
}

// ============================================================================
// MODULE INITIALIZATION AND VALIDATION
// ============================================================================

const LEXICAL_CODES: [crate::logging::Code; 4] = [
    codes::lexical::TOKEN_TOO_LONG,
    codes::lexical::UNTERMINATED_STRING,
    codes::lexical::UNRECOGNIZED_ESCAPE,
    codes::lexical::FRAME_AFTER_END,
];

/// Check that every lexical code resolves to registry metadata
pub fn init_lexical_analysis_logging() -> Result<(), String> {
    for code in &LEXICAL_CODES {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Lexical error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    crate::log_debug!("Lexical limits initialized",
        "max_token_length" => MAX_TOKEN_LENGTH,
        "metrics_buffer_size" => METRICS_BUFFER_SIZE
    );

    Ok(())
}

/// Sanity-check the compile-time limits and the lexer on a known input
pub fn validate_tokenization() -> Result<(), String> {
    if MAX_TOKEN_LENGTH == 0 {
        return Err("MAX_TOKEN_LENGTH cannot be zero".to_string());
    }
    if METRICS_BUFFER_SIZE == 0 {
        return Err("METRICS_BUFFER_SIZE cannot be zero".to_string());
    }

    let output = tokenize_bytes(b"f(-1)").map_err(|e| e.to_string())?;
    if output.tokens.len() != 6 || !output.tokens[5].is_end_of_stream() {
        return Err(format!(
            "Lexer self-check produced {} tokens",
            output.tokens.len()
        ));
    }

    Ok(())
}

/// Compile-time lexical limits, for reporting
pub fn get_lexical_limits() -> LexicalLimits {
    LexicalLimits {
        max_token_length: MAX_TOKEN_LENGTH,
        metrics_buffer_size: METRICS_BUFFER_SIZE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LexicalLimits {
    pub max_token_length: usize,
    pub metrics_buffer_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenClass;

    fn lex(input: &[u8]) -> Vec<Token> {
        tokenize_bytes(input).unwrap().tokens
    }

    fn tok(class: TokenClass, text: &str) -> Token {
        Token::new(class, text)
    }

    #[test]
    fn test_function_call_reclassifies_operand() {
        assert_eq!(
            lex(b"foo("),
            vec![
                tok(TokenClass::Function, "foo"),
                tok(TokenClass::LeftBracket, "("),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_leading_sign_is_unary() {
        assert_eq!(
            lex(b"+1"),
            vec![
                tok(TokenClass::UnarySign, "+"),
                tok(TokenClass::Operand, "1"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_bracket_sign_is_unary() {
        assert_eq!(
            lex(b"f(-1)"),
            vec![
                tok(TokenClass::Function, "f"),
                tok(TokenClass::LeftBracket, "("),
                tok(TokenClass::UnarySign, "-"),
                tok(TokenClass::Operand, "1"),
                tok(TokenClass::RightBracket, ")"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_inner_sign_is_binary() {
        assert_eq!(
            lex(b"a-1"),
            vec![
                tok(TokenClass::Operand, "a"),
                tok(TokenClass::Operator, "-"),
                tok(TokenClass::Operand, "1"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_leading_minus_is_unary() {
        assert_eq!(
            lex(b"-x"),
            vec![
                tok(TokenClass::UnarySign, "-"),
                tok(TokenClass::Operand, "x"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_bracket_plus_is_unary() {
        assert_eq!(
            lex(b"g(+2)"),
            vec![
                tok(TokenClass::Function, "g"),
                tok(TokenClass::LeftBracket, "("),
                tok(TokenClass::UnarySign, "+"),
                tok(TokenClass::Operand, "2"),
                tok(TokenClass::RightBracket, ")"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_bracket_sign_at_end_of_input() {
        assert_eq!(
            lex(b"(+"),
            vec![
                tok(TokenClass::LeftBracket, "("),
                tok(TokenClass::UnarySign, "+"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_leading_sign_wins_over_arrow() {
        assert_eq!(
            lex(b"->x"),
            vec![
                tok(TokenClass::UnarySign, "-"),
                tok(TokenClass::Operator, ">"),
                tok(TokenClass::Operand, "x"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_bracket_sign_wins_over_arrow() {
        assert_eq!(
            lex(b"(->"),
            vec![
                tok(TokenClass::LeftBracket, "("),
                tok(TokenClass::UnarySign, "-"),
                tok(TokenClass::Operator, ">"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_every_byte_value_is_tokenized() {
        for byte in 0..=u8::MAX {
            let output = tokenize_bytes(&[byte]).unwrap();
            assert_eq!(output.tokens.len(), 2, "byte {:#04x}", byte);
            assert!(output.tokens[1].is_end_of_stream());

            let first = &output.tokens[0];
            if byte == b'"' || byte == b'\'' {
                assert_eq!(*first, tok(TokenClass::String, ""));
                assert_eq!(output.diagnostics.len(), 1);
            } else {
                assert_eq!(first.text(), &[byte], "byte {:#04x}", byte);
                assert!(!first.is_end_of_stream());
                assert!(output.diagnostics.is_empty(), "byte {:#04x}", byte);
            }
        }
    }

    #[test]
    fn test_compound_operator_is_one_token() {
        assert_eq!(
            lex(b"a <= b"),
            vec![
                tok(TokenClass::Operand, "a"),
                tok(TokenClass::Blank, " "),
                tok(TokenClass::Operator, "<="),
                tok(TokenClass::Blank, " "),
                tok(TokenClass::Operand, "b"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_arrow_is_dereference() {
        assert_eq!(
            lex(b"p->x"),
            vec![
                tok(TokenClass::Operand, "p"),
                tok(TokenClass::Dereference, "->"),
                tok(TokenClass::Operand, "x"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let output = tokenize_bytes(br"'it\'s'").unwrap();
        assert_eq!(
            output.tokens,
            vec![tok(TokenClass::String, "it's"), Token::end_of_stream()]
        );
        assert!(!output.has_diagnostics());
    }

    #[test]
    fn test_other_quote_kind_is_literal_inside_string() {
        assert_eq!(
            lex(br#""say 'hi'""#),
            vec![tok(TokenClass::String, "say 'hi'"), Token::end_of_stream()]
        );
    }

    #[test]
    fn test_empty_string_literal() {
        assert_eq!(
            lex(b"''"),
            vec![tok(TokenClass::String, ""), Token::end_of_stream()]
        );
    }

    #[test]
    fn test_unrecognized_escape_is_kept() {
        let output = tokenize_bytes(br#""a\nb""#).unwrap();
        assert_eq!(output.tokens[0], tok(TokenClass::String, r"a\nb"));
        assert_eq!(
            output.diagnostics[0].kind,
            DataErrorKind::UnrecognizedEscape { escaped: b'n' }
        );

        let quiet = LexicalPreferences {
            report_unrecognized_escapes: false,
            ..LexicalPreferences::default()
        };
        let output = tokenize_bytes_with_preferences(br#""a\nb""#, quiet).unwrap();
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_string_yields_token_and_diagnostic() {
        let output = tokenize_bytes(b"\"abc").unwrap();
        assert_eq!(
            output.tokens,
            vec![tok(TokenClass::String, "abc"), Token::end_of_stream()]
        );
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(
            output.diagnostics[0].error_code(),
            codes::lexical::UNTERMINATED_STRING
        );
    }

    #[test]
    fn test_oversized_operand_is_truncated_once() {
        let preferences = LexicalPreferences {
            max_token_length: 4,
            ..LexicalPreferences::default()
        };
        let output = tokenize_bytes_with_preferences(b"abcdefgh+xy", preferences).unwrap();

        assert_eq!(output.tokens[0], tok(TokenClass::Operand, "abcd"));
        assert_eq!(output.tokens[1], tok(TokenClass::Operator, "+"));
        assert_eq!(output.tokens[2], tok(TokenClass::Operand, "xy"));
        assert_eq!(
            output.diagnostics,
            vec![LexDiagnostic::new(
                DataErrorKind::TokenTooLong { limit: 4 },
                Some(crate::utils::Position::start()),
            )]
        );
        assert_eq!(output.metrics.truncated_tokens, 1);
    }

    #[test]
    fn test_nul_is_ordinary_data() {
        assert_eq!(
            lex(b"a\0b"),
            vec![
                tok(TokenClass::Operand, "a"),
                Token::single(TokenClass::Operator, 0),
                tok(TokenClass::Operand, "b"),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(lex(b""), vec![Token::end_of_stream()]);
    }

    #[test]
    fn test_exactly_one_end_of_stream_last() {
        let inputs: [&[u8]; 5] = [b"x = y; { z }", b"'", b"(+", b"a,b", b"$1.5 >> 2"];
        for input in inputs {
            let tokens = lex(input);
            let ends = tokens.iter().filter(|t| t.is_end_of_stream()).count();
            assert_eq!(ends, 1, "input {:?}", input);
            assert!(tokens.last().unwrap().is_end_of_stream());
        }
    }

    #[test]
    fn test_one_frame_per_byte() {
        let input = b"f(a, 'b') -> c";
        let frames = char_events(input)
            .filter(|e| matches!(e, CharEvent::Frame(_)))
            .count();
        assert_eq!(frames, input.len());
        assert_eq!(char_events(input).last(), Some(CharEvent::End));
    }

    #[test]
    fn test_module_validation() {
        assert!(init_lexical_analysis_logging().is_ok());
        assert!(validate_tokenization().is_ok());
        assert_eq!(get_lexical_limits().max_token_length, MAX_TOKEN_LENGTH);
    }
}
