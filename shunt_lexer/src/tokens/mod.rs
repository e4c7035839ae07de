//! Token data model shared by every pipeline stage
//!
//! Three item types flow between the stages:
//!
//! - **[`CharEvent`]** - what the byte lookahead stage produces: one
//!   [`CharFrame`] per input byte (the byte plus a one-byte [`Lookahead`]),
//!   then a single out-of-band `End`.
//! - **[`Token`]** - a classified lexeme produced by the lexer. The stream
//!   always ends with exactly one [`TokenClass::EndOfStream`] token.
//! - **[`TripletWindow`]** - three consecutive tokens regrouped by the
//!   triplet stage for the downstream converter.
//!
//! End of input is never encoded as a byte value. A NUL byte in the input
//! is ordinary data.
//!
//! ## Token classes
//!
//! | Class | Record label | Text |
//! |-------|--------------|------|
//! | Operand | `OPRND` | identifier or number run |
//! | Function | `FUNCT` | operand run immediately followed by `(` |
//! | LeftBracket / RightBracket | `BRLFT` / `BRGHT` | `(` / `)` |
//! | Comma / Semicolon | `COMMA` / `SEMICOLON` | `,` / `;` |
//! | BlockStart / BlockEnd | `BLKST` / `BLKEND` | `{` / `}` |
//! | Dereference | `DEREF` | `->` |
//! | String | `STRNG` | literal contents, quotes stripped |
//! | Operator | `OPER` | one- or two-character operator |
//! | UnarySign | `UNARY` | the sign character |
//! | Blank | `BLANK` | a single space |
//! | EndOfStream | `EOS` | empty |

pub mod frame;
pub mod token;
pub mod triplet;

pub use frame::{CharEvent, CharFrame, Lookahead};
pub use token::{Token, TokenClass};
pub use triplet::{PartialWindowPolicy, TripletError, TripletRing, TripletWindow};
