//! Lexer errors: fatal ordering defects and recoverable data diagnostics

use crate::logging::{codes, Code};
use crate::utils::Position;
use serde::Serialize;

/// Fatal lexer errors. These indicate a broken stage contract, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("Character frame {frame} received after end of stream (offset {})", .position.offset)]
    FrameAfterEnd { frame: String, position: Position },
}

impl LexerError {
    pub fn error_code(&self) -> Code {
        match self {
            LexerError::FrameAfterEnd { .. } => codes::lexical::FRAME_AFTER_END,
        }
    }
}

/// Recoverable input problems. The lexer still emits a best-effort token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataErrorKind {
    #[error("Token exceeded {limit} bytes and was truncated")]
    TokenTooLong { limit: usize },

    #[error("String literal opened with {quote} is not terminated")]
    UnterminatedString { quote: char },

    #[error("Escape sequence '\\{}' is not recognized and was kept verbatim", .escaped.escape_ascii())]
    UnrecognizedEscape { escaped: u8 },
}

/// A data error with the position of the offending token or byte
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}{}", .position.map(|p| format!(" at {}", p)).unwrap_or_default())]
pub struct LexDiagnostic {
    #[serde(flatten)]
    pub kind: DataErrorKind,
    pub position: Option<Position>,
}

impl LexDiagnostic {
    pub fn new(kind: DataErrorKind, position: Option<Position>) -> Self {
        Self { kind, position }
    }

    pub fn error_code(&self) -> Code {
        match self.kind {
            DataErrorKind::TokenTooLong { .. } => codes::lexical::TOKEN_TOO_LONG,
            DataErrorKind::UnterminatedString { .. } => codes::lexical::UNTERMINATED_STRING,
            DataErrorKind::UnrecognizedEscape { .. } => codes::lexical::UNRECOGNIZED_ESCAPE,
        }
    }
}
