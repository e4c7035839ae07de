//! Source location tracking for diagnostics
//!
//! The lexer sees one byte at a time, so positions advance per byte.
//! UTF-8 continuation bytes move the offset but not the column.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the input stream with line, column, and byte offset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Byte offset from start of input (0-based)
    pub offset: usize,
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based)
    pub column: u32,
}

impl Position {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Offset 0, line 1, column 1
    pub fn start() -> Self {
        Self::new(0, 1, 1)
    }

    /// Position of the byte following `byte`
    pub fn advance_byte(self, byte: u8) -> Self {
        match byte {
            b'\n' => Self::new(self.offset + 1, self.line + 1, 1),
            0x80..=0xBF => Self::new(self.offset + 1, self.line, self.column),
            _ => Self::new(self.offset + 1, self.line, self.column + 1),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span of input from start to end position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(
            start.offset <= end.offset,
            "Span start must not be after end"
        );
        Self { start, end }
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    /// Span covering the single byte at `pos`
    pub fn single(pos: Position, byte: u8) -> Self {
        Self::new(pos, pos.advance_byte(byte))
    }

    /// Byte length of this span
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(
                f,
                "{}:{}-{}",
                self.start.line, self.start.column, self.end.column
            )
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_ascii_and_newline() {
        let pos = Position::start().advance_byte(b'a').advance_byte(b'b');
        assert_eq!(pos, Position::new(2, 1, 3));

        let pos = pos.advance_byte(b'\n');
        assert_eq!(pos, Position::new(3, 2, 1));
    }

    #[test]
    fn test_continuation_bytes_keep_column() {
        // "é" is 0xC3 0xA9
        let pos = Position::start().advance_byte(0xC3).advance_byte(0xA9);
        assert_eq!(pos.offset, 2);
        assert_eq!(pos.column, 2);
    }

    #[test]
    fn test_single_span() {
        let span = Span::single(Position::start(), b'x');
        assert_eq!(span.len(), 1);
        assert!(!span.is_empty());
        assert_eq!(span.to_string(), "1:1-2");
    }
}
