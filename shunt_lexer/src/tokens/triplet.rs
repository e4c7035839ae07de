//! Sliding three-token windows
//!
//! The ring holds the last three tokens, addressed by `consumed % 3`.
//! For `[A, B, C, D, EOS]` the default policy yields
//! `(A,B,C)`, `(B,C,D)`, `(C,D,EOS)` and nothing after that.

use super::token::Token;
use crate::logging::codes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const RING_SLOTS: usize = 3;

/// Three consecutive tokens, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripletWindow {
    pub oldest: Token,
    pub middle: Token,
    pub newest: Token,
}

impl TripletWindow {
    pub fn new(oldest: Token, middle: Token, newest: Token) -> Self {
        Self {
            oldest,
            middle,
            newest,
        }
    }

    /// The last window of a stream has EndOfStream in its newest slot
    pub fn is_final(&self) -> bool {
        self.newest.is_end_of_stream()
    }
}

impl fmt::Display for TripletWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.oldest, self.middle, self.newest)
    }
}

/// How windows are produced before three tokens have been consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialWindowPolicy {
    /// No window until the ring is full; streams shorter than three tokens
    /// produce no windows at all
    #[default]
    Suppress,
    /// One window per token; slots before the first token hold
    /// [`Token::filler`]
    Fill,
}

impl FromStr for PartialWindowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "suppress" => Ok(PartialWindowPolicy::Suppress),
            "fill" => Ok(PartialWindowPolicy::Fill),
            other => Err(format!("Unknown partial window policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripletError {
    #[error("Token {token} received after EndOfStream ({consumed} tokens consumed)")]
    TokenAfterEndOfStream { token: String, consumed: usize },
}

impl TripletError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            TripletError::TokenAfterEndOfStream { .. } => {
                codes::triplet::TOKEN_AFTER_END_OF_STREAM
            }
        }
    }
}

/// Fixed-capacity ring buffer behind the triplet stage
#[derive(Debug, Clone)]
pub struct TripletRing {
    slots: [Option<Token>; RING_SLOTS],
    consumed: usize,
    policy: PartialWindowPolicy,
    finished: bool,
}

impl TripletRing {
    pub fn new(policy: PartialWindowPolicy) -> Self {
        Self {
            slots: [None, None, None],
            consumed: 0,
            policy,
            finished: false,
        }
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// True once EndOfStream has been pushed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consume one token and return the window it completes, if any
    pub fn push(&mut self, token: Token) -> Result<Option<TripletWindow>, TripletError> {
        if self.finished {
            return Err(TripletError::TokenAfterEndOfStream {
                token: token.to_string(),
                consumed: self.consumed,
            });
        }

        self.finished = token.is_end_of_stream();
        self.slots[self.consumed % RING_SLOTS] = Some(token);
        self.consumed += 1;

        if self.consumed < RING_SLOTS && self.policy == PartialWindowPolicy::Suppress {
            return Ok(None);
        }

        Ok(Some(TripletWindow::new(
            self.slot_back(2),
            self.slot_back(1),
            self.slot_back(0),
        )))
    }

    /// Token `back` positions before the newest one, or filler
    fn slot_back(&self, back: usize) -> Token {
        if back >= self.consumed {
            return Token::filler();
        }
        let index = (self.consumed - 1 - back) % RING_SLOTS;
        self.slots[index].clone().unwrap_or_else(Token::filler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenClass;
    use assert_matches::assert_matches;

    fn operand(text: &str) -> Token {
        Token::new(TokenClass::Operand, text)
    }

    fn drain(ring: &mut TripletRing, tokens: Vec<Token>) -> Vec<TripletWindow> {
        tokens
            .into_iter()
            .filter_map(|t| ring.push(t).unwrap())
            .collect()
    }

    #[test]
    fn test_suppressed_windows() {
        let (a, b, c, d) = (operand("A"), operand("B"), operand("C"), operand("D"));
        let eos = Token::end_of_stream();
        let mut ring = TripletRing::new(PartialWindowPolicy::Suppress);

        let windows = drain(
            &mut ring,
            vec![a.clone(), b.clone(), c.clone(), d.clone(), eos.clone()],
        );

        assert_eq!(
            windows,
            vec![
                TripletWindow::new(a, b.clone(), c.clone()),
                TripletWindow::new(b, c.clone(), d.clone()),
                TripletWindow::new(c, d, eos),
            ]
        );
        assert!(windows.last().unwrap().is_final());
        assert!(ring.is_finished());
    }

    #[test]
    fn test_filled_windows() {
        let a = operand("A");
        let eos = Token::end_of_stream();
        let mut ring = TripletRing::new(PartialWindowPolicy::Fill);

        let windows = drain(&mut ring, vec![a.clone(), eos.clone()]);

        assert_eq!(
            windows,
            vec![
                TripletWindow::new(Token::filler(), Token::filler(), a.clone()),
                TripletWindow::new(Token::filler(), a, eos),
            ]
        );
    }

    #[test]
    fn test_short_stream_suppressed_entirely() {
        let mut ring = TripletRing::new(PartialWindowPolicy::Suppress);
        let windows = drain(&mut ring, vec![operand("x"), Token::end_of_stream()]);
        assert!(windows.is_empty());
        assert!(ring.is_finished());
    }

    #[test]
    fn test_ring_wraps_past_capacity() {
        let mut ring = TripletRing::new(PartialWindowPolicy::Suppress);
        let tokens: Vec<Token> = (0..10).map(|i| operand(&i.to_string())).collect();
        let windows = drain(&mut ring, tokens);

        assert_eq!(windows.len(), 8);
        assert_eq!(
            windows[7],
            TripletWindow::new(operand("7"), operand("8"), operand("9"))
        );
        assert_eq!(ring.consumed(), 10);
    }

    #[test]
    fn test_token_after_end_is_rejected() {
        let mut ring = TripletRing::new(PartialWindowPolicy::Fill);
        ring.push(Token::end_of_stream()).unwrap();

        let result = ring.push(operand("late"));
        assert_matches!(
            result,
            Err(TripletError::TokenAfterEndOfStream { consumed: 1, .. })
        );
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("FILL".parse::<PartialWindowPolicy>(), Ok(PartialWindowPolicy::Fill));
        assert_eq!("suppress".parse::<PartialWindowPolicy>(), Ok(PartialWindowPolicy::Suppress));
        assert!("partial".parse::<PartialWindowPolicy>().is_err());
    }
}
