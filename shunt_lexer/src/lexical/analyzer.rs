//! Push-driven lexer state machine
//!
//! The machine consumes one [`CharEvent`] at a time and appends any tokens it
//! completes to a caller-owned buffer. It never looks further ahead than the
//! frame's `next` byte, so the same machine drives both the in-memory
//! tokenizer and the concurrent lexer stage.

use super::classify::{classify, is_sign, two_char_operator, CharClass};
use super::error::{DataErrorKind, LexDiagnostic, LexerError};
use crate::config::compile_time::lexical::METRICS_BUFFER_SIZE;
use crate::config::runtime::LexicalPreferences;
use crate::log_warning;
use crate::tokens::{CharEvent, CharFrame, Token, TokenClass};
use crate::utils::{Position, Span};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// The previous frame already consumed this frame's byte as its lookahead
    SkipNext,
    String {
        quote: u8,
        skip_next: bool,
    },
    Finished,
}

/// Token counts and sizes gathered while lexing
#[derive(Debug, Default, Clone, Serialize)]
pub struct LexicalMetrics {
    pub frames: usize,
    pub total_tokens: usize,
    pub tokens_by_class: BTreeMap<TokenClass, usize>,
    pub max_operand_length: usize,
    pub max_string_length: usize,
    pub string_literals: usize,
    pub truncated_tokens: usize,
    pub diagnostics: usize,

    // Only filled when track_operator_patterns is set
    pub operator_usage_patterns: BTreeMap<String, usize>,
}

impl LexicalMetrics {
    pub(crate) fn record_frame(&mut self) {
        self.frames += 1;
    }

    pub(crate) fn record_token(&mut self, token: &Token, preferences: &LexicalPreferences) {
        self.total_tokens += 1;
        *self.tokens_by_class.entry(token.class()).or_insert(0) += 1;

        match token.class() {
            TokenClass::Operand | TokenClass::Function => {
                self.max_operand_length = self.max_operand_length.max(token.text().len());
            }
            TokenClass::String => {
                self.string_literals += 1;
                self.max_string_length = self.max_string_length.max(token.text().len());
            }
            TokenClass::Operator | TokenClass::Dereference | TokenClass::UnarySign => {
                if preferences.track_operator_patterns {
                    self.record_operator_pattern(&token.text_lossy());
                }
            }
            _ => {}
        }
    }

    fn record_operator_pattern(&mut self, operator: &str) {
        if let Some(count) = self.operator_usage_patterns.get_mut(operator) {
            *count += 1;
        } else if self.operator_usage_patterns.len() < METRICS_BUFFER_SIZE {
            self.operator_usage_patterns.insert(operator.to_string(), 1);
        }
    }

    pub(crate) fn record_truncation(&mut self) {
        self.truncated_tokens += 1;
    }

    pub(crate) fn record_diagnostic(&mut self) {
        self.diagnostics += 1;
    }

    pub fn count(&self, class: TokenClass) -> usize {
        self.tokens_by_class.get(&class).copied().unwrap_or(0)
    }
}

/// Converts character events into classified tokens
#[derive(Debug)]
pub struct LexerStateMachine {
    mode: Mode,
    buffer: Vec<u8>,
    truncated: bool,
    max_token_length: usize,
    position: Position,
    token_start: Position,
    preferences: LexicalPreferences,
    metrics: LexicalMetrics,
    diagnostics: Vec<LexDiagnostic>,
}

impl Default for LexerStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LexerStateMachine {
    pub fn new() -> Self {
        Self::with_preferences(LexicalPreferences::default())
    }

    pub fn with_preferences(preferences: LexicalPreferences) -> Self {
        Self {
            mode: Mode::Normal,
            buffer: Vec::new(),
            truncated: false,
            max_token_length: preferences.effective_max_token_length(),
            position: Position::start(),
            token_start: Position::start(),
            preferences,
            metrics: LexicalMetrics::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Consume one event, appending completed tokens to `out`.
    ///
    /// Data problems never fail this call; they are queued for
    /// [`take_diagnostics`](Self::take_diagnostics). An error means the
    /// caller broke the event ordering contract.
    pub fn feed(&mut self, event: CharEvent, out: &mut Vec<Token>) -> Result<(), LexerError> {
        match event {
            CharEvent::Frame(frame) => self.feed_frame(frame, out),
            CharEvent::End => self.finish(out),
        }
    }

    /// True once the end event has been processed
    pub fn is_finished(&self) -> bool {
        self.mode == Mode::Finished
    }

    /// Position of the next byte the machine expects
    pub fn position(&self) -> Position {
        self.position
    }

    /// Drain diagnostics raised since the last call
    pub fn take_diagnostics(&mut self) -> Vec<LexDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    pub fn into_metrics(self) -> LexicalMetrics {
        self.metrics
    }

    pub fn preferences(&self) -> &LexicalPreferences {
        &self.preferences
    }

    fn feed_frame(&mut self, frame: CharFrame, out: &mut Vec<Token>) -> Result<(), LexerError> {
        let here = self.position;

        match self.mode {
            Mode::Finished => {
                return Err(LexerError::FrameAfterEnd {
                    frame: frame.to_string(),
                    position: here,
                })
            }
            Mode::SkipNext => self.mode = Mode::Normal,
            Mode::String {
                quote,
                skip_next: true,
            } => {
                self.mode = Mode::String {
                    quote,
                    skip_next: false,
                }
            }
            Mode::String {
                quote,
                skip_next: false,
            } => self.scan_string(quote, frame, here, out),
            Mode::Normal => self.lex_normal(frame, here, out),
        }

        self.position = here.advance_byte(frame.current);
        self.metrics.record_frame();
        Ok(())
    }

    fn lex_normal(&mut self, frame: CharFrame, here: Position, out: &mut Vec<Token>) {
        let byte = frame.current;
        let class = classify(byte);

        if class != CharClass::Operand && !self.buffer.is_empty() {
            let flushed = if class == CharClass::LeftBracket {
                TokenClass::Function
            } else {
                TokenClass::Operand
            };
            self.flush(flushed, out);
        }

        // No catch-all arm: every class is handled explicitly
        match class {
            CharClass::Operand => self.append(byte, here),
            CharClass::Operator => self.lex_operator(frame, out),
            CharClass::LeftBracket => {
                self.emit(Token::single(TokenClass::LeftBracket, byte), out);
                if let Some(sign) = frame.next.byte().filter(|b| is_sign(*b)) {
                    self.emit(Token::single(TokenClass::UnarySign, sign), out);
                    self.mode = Mode::SkipNext;
                }
            }
            CharClass::DoubleQuote | CharClass::SingleQuote => {
                self.token_start = here;
                self.mode = Mode::String {
                    quote: byte,
                    skip_next: false,
                };
            }
            CharClass::Blank => self.emit(Token::single(TokenClass::Blank, byte), out),
            CharClass::RightBracket => {
                self.emit(Token::single(TokenClass::RightBracket, byte), out)
            }
            CharClass::Comma => self.emit(Token::single(TokenClass::Comma, byte), out),
            CharClass::Semicolon => self.emit(Token::single(TokenClass::Semicolon, byte), out),
            CharClass::BlockStart => self.emit(Token::single(TokenClass::BlockStart, byte), out),
            CharClass::BlockEnd => self.emit(Token::single(TokenClass::BlockEnd, byte), out),
        }
    }

    fn lex_operator(&mut self, frame: CharFrame, out: &mut Vec<Token>) {
        // A sign that opens the input is unary and never pairs
        if self.metrics.frames == 0 && is_sign(frame.current) {
            self.emit(Token::single(TokenClass::UnarySign, frame.current), out);
            return;
        }

        let paired = frame
            .next
            .byte()
            .and_then(|next| two_char_operator(frame.current, next).map(|c| (c, next)));
        match paired {
            Some((token_class, next)) => {
                self.emit(Token::new(token_class, [frame.current, next]), out);
                self.mode = Mode::SkipNext;
            }
            None => self.emit(Token::single(TokenClass::Operator, frame.current), out),
        }
    }

    fn scan_string(&mut self, quote: u8, frame: CharFrame, here: Position, out: &mut Vec<Token>) {
        if frame.current == b'\\' && frame.next.is(quote) {
            self.append(quote, here);
            self.mode = Mode::String {
                quote,
                skip_next: true,
            };
            return;
        }

        if frame.current == quote {
            self.flush(TokenClass::String, out);
            self.mode = Mode::Normal;
            return;
        }

        if frame.current == b'\\' && self.preferences.report_unrecognized_escapes {
            if let Some(escaped) = frame.next.byte() {
                self.report(DataErrorKind::UnrecognizedEscape { escaped }, here);
            }
        }
        self.append(frame.current, here);
    }

    fn finish(&mut self, out: &mut Vec<Token>) -> Result<(), LexerError> {
        match self.mode {
            Mode::Finished => {
                return Err(LexerError::FrameAfterEnd {
                    frame: "END".to_string(),
                    position: self.position,
                })
            }
            Mode::String { quote, .. } => {
                self.flush(TokenClass::String, out);
                let start = self.token_start;
                self.report(
                    DataErrorKind::UnterminatedString {
                        quote: quote as char,
                    },
                    start,
                );
            }
            Mode::Normal | Mode::SkipNext => {
                if !self.buffer.is_empty() {
                    self.flush(TokenClass::Operand, out);
                }
            }
        }

        self.emit(Token::end_of_stream(), out);
        self.mode = Mode::Finished;
        Ok(())
    }

    /// Buffer one byte of the current operand or string. Bytes past the
    /// length limit are dropped and reported once per token.
    fn append(&mut self, byte: u8, here: Position) {
        if self.buffer.is_empty() && self.mode == Mode::Normal {
            self.token_start = here;
        }

        if self.buffer.len() < self.max_token_length {
            self.buffer.push(byte);
            return;
        }

        if !self.truncated {
            self.truncated = true;
            self.metrics.record_truncation();
            let start = self.token_start;
            self.report(
                DataErrorKind::TokenTooLong {
                    limit: self.max_token_length,
                },
                start,
            );
        }
    }

    fn flush(&mut self, class: TokenClass, out: &mut Vec<Token>) {
        let text = std::mem::take(&mut self.buffer);
        self.truncated = false;
        self.emit(Token::new(class, text), out);
    }

    fn emit(&mut self, token: Token, out: &mut Vec<Token>) {
        self.metrics.record_token(&token, &self.preferences);
        out.push(token);
    }

    fn report(&mut self, kind: DataErrorKind, at: Position) {
        let position = self.preferences.include_position_in_errors.then_some(at);
        let diagnostic = LexDiagnostic::new(kind, position);

        log_warning!(code = diagnostic.error_code(), &diagnostic.to_string(),
            span = Span::new(at, self.position),
            "offset" => at.offset
        );

        self.metrics.record_diagnostic();
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Lookahead;
    use assert_matches::assert_matches;

    fn frame(current: u8, next: Option<u8>) -> CharEvent {
        CharEvent::Frame(CharFrame::new(current, Lookahead::from(next)))
    }

    fn run(machine: &mut LexerStateMachine, input: &[u8]) -> Vec<Token> {
        let mut out = Vec::new();
        for (i, &byte) in input.iter().enumerate() {
            machine
                .feed(frame(byte, input.get(i + 1).copied()), &mut out)
                .unwrap();
        }
        machine.feed(CharEvent::End, &mut out).unwrap();
        out
    }

    #[test]
    fn test_tokens_are_emitted_incrementally() {
        let mut machine = LexerStateMachine::new();
        let mut out = Vec::new();

        machine.feed(frame(b'a', Some(b'+')), &mut out).unwrap();
        assert!(out.is_empty());

        machine.feed(frame(b'+', Some(b'b')), &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                Token::new(TokenClass::Operand, "a"),
                Token::single(TokenClass::Operator, b'+'),
            ]
        );
    }

    #[test]
    fn test_frame_after_end_is_fatal() {
        let mut machine = LexerStateMachine::new();
        let mut out = Vec::new();
        machine.feed(CharEvent::End, &mut out).unwrap();
        assert!(machine.is_finished());

        let result = machine.feed(frame(b'x', None), &mut out);
        assert_matches!(result, Err(LexerError::FrameAfterEnd { .. }));

        let result = machine.feed(CharEvent::End, &mut out);
        assert_matches!(result, Err(LexerError::FrameAfterEnd { .. }));
        assert_eq!(out, vec![Token::end_of_stream()]);
    }

    #[test]
    fn test_position_tracks_lines() {
        let mut machine = LexerStateMachine::new();
        run(&mut machine, b"a\nbc");
        assert_eq!(machine.position(), Position::new(4, 2, 3));
    }

    #[test]
    fn test_unterminated_string_position() {
        let mut machine = LexerStateMachine::new();
        let tokens = run(&mut machine, b"x = \"abc");

        assert_eq!(tokens[4], Token::new(TokenClass::String, "abc"));
        let diagnostics = machine.take_diagnostics();
        assert_eq!(
            diagnostics,
            vec![LexDiagnostic::new(
                DataErrorKind::UnterminatedString { quote: '"' },
                Some(Position::new(4, 1, 5)),
            )]
        );
        assert!(machine.take_diagnostics().is_empty());
    }

    #[test]
    fn test_positions_can_be_omitted() {
        let preferences = LexicalPreferences {
            include_position_in_errors: false,
            ..LexicalPreferences::default()
        };
        let mut machine = LexerStateMachine::with_preferences(preferences);
        run(&mut machine, b"'open");
        assert_eq!(machine.take_diagnostics()[0].position, None);
    }

    #[test]
    fn test_metrics() {
        let preferences = LexicalPreferences {
            track_operator_patterns: true,
            ..LexicalPreferences::default()
        };
        let mut machine = LexerStateMachine::with_preferences(preferences);
        run(&mut machine, b"abc+d+'xy'&&e");

        let metrics = machine.metrics();
        assert_eq!(metrics.frames, 13);
        assert_eq!(metrics.count(TokenClass::Operand), 3);
        assert_eq!(metrics.count(TokenClass::EndOfStream), 1);
        assert_eq!(metrics.max_operand_length, 3);
        assert_eq!(metrics.string_literals, 1);
        assert_eq!(metrics.max_string_length, 2);
        assert_eq!(metrics.operator_usage_patterns.get("+"), Some(&2));
        assert_eq!(metrics.operator_usage_patterns.get("&&"), Some(&1));
    }

    #[test]
    fn test_operator_patterns_off_by_default() {
        let preferences = LexicalPreferences {
            track_operator_patterns: false,
            ..LexicalPreferences::default()
        };
        let mut machine = LexerStateMachine::with_preferences(preferences);
        run(&mut machine, b"a+b");
        assert!(machine.metrics().operator_usage_patterns.is_empty());
    }
}
