//! Concurrent pipeline stages
//!
//! Every stage is an async function that owns its input receiver and output
//! sender, runs until it has forwarded its terminal item, and returns a
//! [`StageReport`]. Returning drops the sender, which closes the channel for
//! the next stage.

pub mod lexer;
pub mod lookahead;
pub mod source;
pub mod triplet;

pub use lexer::{run_lexer, LexerStageOutput};
pub use lookahead::run_lookahead;
pub use source::run_source;
pub use triplet::run_triplets;

pub use crate::pipeline::StageError;

use std::time::{Duration, Instant};

pub const SOURCE_STAGE: &str = "source";
pub const LOOKAHEAD_STAGE: &str = "lookahead";
pub const LEXER_STAGE: &str = "lexer";
pub const TRIPLET_STAGE: &str = "triplet";
pub const DIAGNOSTICS_STAGE: &str = "diagnostics";

/// Item counts for one finished stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub stage: &'static str,
    pub items_in: usize,
    pub items_out: usize,
    pub duration: Duration,
}

impl StageReport {
    fn start(stage: &'static str) -> (Self, Instant) {
        (
            Self {
                stage,
                items_in: 0,
                items_out: 0,
                duration: Duration::ZERO,
            },
            Instant::now(),
        )
    }

    fn finish(mut self, started: Instant) -> Self {
        self.duration = started.elapsed();
        crate::log_debug!("Stage finished",
            "stage" => self.stage,
            "items_in" => self.items_in,
            "items_out" => self.items_out
        );
        self
    }
}
