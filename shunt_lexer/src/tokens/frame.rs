//! Byte lookahead frames

use std::fmt;

/// The lookahead slot of a frame. End of input is a distinct variant so that
/// every byte value, NUL included, remains ordinary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookahead {
    Byte(u8),
    End,
}

impl Lookahead {
    pub fn byte(self) -> Option<u8> {
        match self {
            Lookahead::Byte(b) => Some(b),
            Lookahead::End => None,
        }
    }

    pub fn is(self, expected: u8) -> bool {
        self == Lookahead::Byte(expected)
    }

    pub fn is_end(self) -> bool {
        self == Lookahead::End
    }
}

impl From<Option<u8>> for Lookahead {
    fn from(next: Option<u8>) -> Self {
        next.map_or(Lookahead::End, Lookahead::Byte)
    }
}

/// One input byte together with the byte that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharFrame {
    pub current: u8,
    pub next: Lookahead,
}

impl CharFrame {
    pub fn new(current: u8, next: Lookahead) -> Self {
        Self { current, next }
    }
}

impl fmt::Display for CharFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.next {
            Lookahead::Byte(b) => write!(
                f,
                "'{}' -> '{}'",
                self.current.escape_ascii(),
                b.escape_ascii()
            ),
            Lookahead::End => write!(f, "'{}' -> END", self.current.escape_ascii()),
        }
    }
}

/// Item written by the byte lookahead stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharEvent {
    Frame(CharFrame),
    /// Written exactly once, after the last frame
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nul_is_data_not_end() {
        let frame = CharFrame::new(b'a', Lookahead::from(Some(0u8)));
        assert_eq!(frame.next, Lookahead::Byte(0));
        assert!(!frame.next.is_end());
        assert_eq!(frame.next.byte(), Some(0));
    }

    #[test]
    fn test_lookahead_from_option() {
        assert_eq!(Lookahead::from(None::<u8>), Lookahead::End);
        assert!(Lookahead::from(Some(b'+')).is(b'+'));
        assert!(!Lookahead::End.is(0));
    }

    #[test]
    fn test_frame_display() {
        assert_eq!(CharFrame::new(b'a', Lookahead::Byte(b'\n')).to_string(), "'a' -> '\\n'");
        assert_eq!(CharFrame::new(b'z', Lookahead::End).to_string(), "'z' -> END");
    }
}
