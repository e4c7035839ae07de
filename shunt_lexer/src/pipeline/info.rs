use crate::config::compile_time::{channels, lexical, pipeline};
use crate::stages::{LEXER_STAGE, LOOKAHEAD_STAGE, SOURCE_STAGE, TRIPLET_STAGE};

/// Static description of the pipeline and its build limits
#[derive(Debug, Clone)]
pub struct PipelineInfo {
    pub stages: Vec<&'static str>,
    pub build_profile: &'static str,
    pub config_source: String,
    pub max_token_length: usize,
    pub channel_capacities: [usize; 5],
    pub read_chunk_size: usize,
    pub default_timeout_ms: u64,
    pub max_timeout_ms: u64,
}

impl PipelineInfo {
    pub fn report(&self) -> String {
        format!(
            "Tokenizer Pipeline:\n\
             - Stages: {}\n\
             - Build Profile: {} ({})\n\
             - Max Token Length: {} bytes\n\
             - Channel Capacities (bytes/frames/tokens/triplets/diagnostics): {:?}\n\
             - Read Chunk Size: {} bytes\n\
             - Default Timeout: {} ms\n\
             - Max Timeout: {} ms",
            self.stages.join(" -> "),
            self.build_profile,
            self.config_source,
            self.max_token_length,
            self.channel_capacities,
            self.read_chunk_size,
            self.default_timeout_ms,
            self.max_timeout_ms
        )
    }

    pub fn summary(&self) -> String {
        format!(
            "{}-stage streaming tokenizer ({} profile)",
            self.stages.len(),
            self.build_profile
        )
    }
}

pub fn get_pipeline_info() -> PipelineInfo {
    PipelineInfo {
        stages: vec![SOURCE_STAGE, LOOKAHEAD_STAGE, LEXER_STAGE, TRIPLET_STAGE],
        build_profile: crate::config::build_info::profile(),
        config_source: crate::config::build_info::source_info(),
        max_token_length: lexical::MAX_TOKEN_LENGTH,
        channel_capacities: [
            channels::BYTE_CHANNEL_CAPACITY,
            channels::FRAME_CHANNEL_CAPACITY,
            channels::TOKEN_CHANNEL_CAPACITY,
            channels::TRIPLET_CHANNEL_CAPACITY,
            channels::DIAGNOSTIC_CHANNEL_CAPACITY,
        ],
        read_chunk_size: channels::READ_CHUNK_SIZE,
        default_timeout_ms: pipeline::DEFAULT_TIMEOUT_MS,
        max_timeout_ms: pipeline::MAX_TIMEOUT_MS,
    }
}
