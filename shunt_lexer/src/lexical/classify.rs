//! Byte classification for the lexer

use crate::tokens::TokenClass;

/// Operators that form a single token when their two bytes are adjacent
const TWO_CHAR_OPERATORS: [&[u8; 2]; 7] = [b"&&", b"||", b"<=", b">=", b"==", b"<<", b">>"];

/// Lexical class of a single input byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Operand,
    Blank,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    BlockStart,
    BlockEnd,
    DoubleQuote,
    SingleQuote,
    Operator,
}

/// Letters, digits, `_`, `.` and `$` build operands; everything unmapped,
/// including NUL and non-ASCII bytes, is an operator byte.
pub fn classify(byte: u8) -> CharClass {
    match byte {
        b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'.' | b'$' => CharClass::Operand,
        b' ' => CharClass::Blank,
        b'(' => CharClass::LeftBracket,
        b')' => CharClass::RightBracket,
        b',' => CharClass::Comma,
        b';' => CharClass::Semicolon,
        b'{' => CharClass::BlockStart,
        b'}' => CharClass::BlockEnd,
        b'"' => CharClass::DoubleQuote,
        b'\'' => CharClass::SingleQuote,
        _ => CharClass::Operator,
    }
}

pub fn is_sign(byte: u8) -> bool {
    byte == b'+' || byte == b'-'
}

/// Class of the token formed by two adjacent operator bytes, if they pair
pub fn two_char_operator(first: u8, second: u8) -> Option<TokenClass> {
    let pair = [first, second];
    if &pair == b"->" {
        Some(TokenClass::Dereference)
    } else if TWO_CHAR_OPERATORS.iter().any(|op| **op == pair) {
        Some(TokenClass::Operator)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_bytes() {
        for byte in b"azAZ09_.$".iter().copied() {
            assert_eq!(classify(byte), CharClass::Operand, "byte {}", byte);
        }
    }

    #[test]
    fn test_unmapped_bytes_are_operators() {
        for byte in [b'+', b'*', b'\t', b'\n', b'\\', 0u8, 0xC3] {
            assert_eq!(classify(byte), CharClass::Operator, "byte {}", byte);
        }
    }

    #[test]
    fn test_punctuation_classes() {
        assert_eq!(classify(b'{'), CharClass::BlockStart);
        assert_eq!(classify(b' '), CharClass::Blank);
        assert_eq!(classify(b'"'), CharClass::DoubleQuote);
        assert_eq!(classify(b'\''), CharClass::SingleQuote);
    }

    #[test]
    fn test_two_char_operators() {
        for op in [b"&&", b"||", b"<=", b">=", b"==", b"<<", b">>"] {
            assert_eq!(two_char_operator(op[0], op[1]), Some(TokenClass::Operator));
        }
        assert_eq!(two_char_operator(b'-', b'>'), Some(TokenClass::Dereference));
        assert_eq!(two_char_operator(b'!', b'='), None);
        assert_eq!(two_char_operator(b'+', b'+'), None);
    }
}
