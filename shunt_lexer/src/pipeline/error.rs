use crate::channel::ChannelError;
use crate::lexical::{LexDiagnostic, LexerError};
use crate::logging::{codes, Code};
use crate::tokens::TripletError;

/// Broken internal contracts. Any of these aborts the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalError {
    #[error("Lexer failed: {0}")]
    Lexer(#[from] LexerError),

    #[error("Triplet stage failed: {0}")]
    Triplet(#[from] TripletError),

    #[error("Input of stage '{stage}' closed before its end-of-stream marker")]
    TruncatedStream { stage: &'static str },

    #[error("Stage '{stage}' lost its downstream consumer")]
    StageDisconnected { stage: &'static str },

    #[error("Stage '{stage}' panicked: {message}")]
    StagePanicked { stage: &'static str, message: String },
}

impl FatalError {
    pub fn error_code(&self) -> Code {
        match self {
            FatalError::Lexer(e) => e.error_code(),
            FatalError::Triplet(e) => e.error_code(),
            FatalError::TruncatedStream { .. } => codes::pipeline::TRUNCATED_STREAM,
            FatalError::StageDisconnected { .. } => codes::pipeline::STAGE_DISCONNECTED,
            FatalError::StagePanicked { .. } => codes::pipeline::STAGE_PANICKED,
        }
    }

    /// Errors that are usually the echo of another stage failing first
    pub fn is_secondary(&self) -> bool {
        matches!(
            self,
            FatalError::TruncatedStream { .. } | FatalError::StageDisconnected { .. }
        )
    }
}

/// How a single stage task ended when it did not finish cleanly
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Fatal(#[from] FatalError),

    #[error("Stage '{stage}' was cancelled")]
    Cancelled { stage: &'static str },
}

impl From<ChannelError> for StageError {
    fn from(error: ChannelError) -> Self {
        match error {
            ChannelError::Cancelled { stage } => StageError::Cancelled { stage },
            ChannelError::Disconnected { stage } => {
                StageError::Fatal(FatalError::StageDisconnected { stage })
            }
        }
    }
}

impl From<LexerError> for StageError {
    fn from(error: LexerError) -> Self {
        StageError::Fatal(error.into())
    }
}

impl From<TripletError> for StageError {
    fn from(error: TripletError) -> Self {
        StageError::Fatal(error.into())
    }
}

/// Pipeline errors returned to callers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline aborted: {0}")]
    Fatal(#[from] FatalError),

    #[error("Pipeline aborted on data error: {0}")]
    Data(LexDiagnostic),

    #[error("Pipeline was cancelled")]
    Cancelled,

    #[error("Pipeline timed out after {after_ms} ms")]
    TimedOut { after_ms: u64 },

    #[error("Invalid pipeline configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl PipelineError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            PipelineError::Fatal(e) => e.error_code(),
            PipelineError::Data(_) => codes::pipeline::DATA_ERROR_ABORT,
            PipelineError::Cancelled => codes::pipeline::PIPELINE_CANCELLED,
            PipelineError::TimedOut { .. } => codes::pipeline::PIPELINE_TIMEOUT,
            PipelineError::InvalidConfiguration { .. } => codes::system::CONFIGURATION_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Position;

    #[test]
    fn test_channel_errors_map_to_stage_errors() {
        assert_eq!(
            StageError::from(ChannelError::Cancelled { stage: "lexer" }),
            StageError::Cancelled { stage: "lexer" }
        );
        assert_eq!(
            StageError::from(ChannelError::Disconnected { stage: "lexer" }),
            StageError::Fatal(FatalError::StageDisconnected { stage: "lexer" })
        );
    }

    #[test]
    fn test_fatal_codes_follow_source_error() {
        let lexer = FatalError::from(LexerError::FrameAfterEnd {
            frame: "END".to_string(),
            position: Position::start(),
        });
        assert_eq!(lexer.error_code(), codes::lexical::FRAME_AFTER_END);
        assert!(!lexer.is_secondary());
        assert!(FatalError::TruncatedStream { stage: "triplet" }.is_secondary());
    }

    #[test]
    fn test_pipeline_error_codes() {
        assert_eq!(
            PipelineError::TimedOut { after_ms: 5 }.error_code(),
            codes::pipeline::PIPELINE_TIMEOUT
        );
        assert_eq!(
            PipelineError::invalid_configuration("zero timeout").to_string(),
            "Invalid pipeline configuration: zero timeout"
        );
    }
}
