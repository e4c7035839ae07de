//! Shared primitive types used across the pipeline stages

pub mod span;

pub use span::{Position, Span};
