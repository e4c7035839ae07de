//! Streaming expression tokenizer
//!
//! Bytes flow through a chain of concurrent stages connected by bounded
//! channels: a byte source, a one-byte lookahead framer, the lexer state
//! machine and an optional three-token window stage. See [`pipeline`] for
//! the concurrent entry points and [`lexical::tokenize_bytes`] for the
//! in-memory one.

// Internal modules
#[macro_use]
pub mod logging;
pub mod channel;
pub mod config;
pub mod lexical;
pub mod output;
pub mod pipeline;
pub mod stages;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use lexical::{tokenize_bytes, DataErrorKind, LexDiagnostic, LexOutput};
pub use output::{OutputFormat, Render};
pub use pipeline::{
    FatalError, Pipeline, PipelineConfig, PipelineError, PipelineOutcome, RunningPipeline,
};
pub use tokens::{PartialWindowPolicy, Token, TokenClass, TripletWindow};
