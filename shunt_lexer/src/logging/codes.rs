//! Consolidated error codes and classification system
//!
//! Every code the crate logs, with its registry metadata.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_ERROR: Code = Code::new("ERR003");
}

/// Byte source error codes
pub mod source {
    use super::Code;

    pub const SOURCE_OPEN_FAILURE: Code = Code::new("E005");
    pub const SOURCE_READ_ERROR: Code = Code::new("E006");
}

/// Lexical analysis error codes
pub mod lexical {
    use super::Code;

    pub const TOKEN_TOO_LONG: Code = Code::new("E020");
    pub const UNTERMINATED_STRING: Code = Code::new("E021");
    pub const UNRECOGNIZED_ESCAPE: Code = Code::new("E022");
    pub const FRAME_AFTER_END: Code = Code::new("E023");
}

/// Token triplet error codes
pub mod triplet {
    use super::Code;

    pub const TOKEN_AFTER_END_OF_STREAM: Code = Code::new("E040");
}

/// Stage harness and orchestration error codes
pub mod pipeline {
    use super::Code;

    pub const TRUNCATED_STREAM: Code = Code::new("E060");
    pub const STAGE_DISCONNECTED: Code = Code::new("E061");
    pub const STAGE_PANICKED: Code = Code::new("E062");
    pub const PIPELINE_CANCELLED: Code = Code::new("E063");
    pub const PIPELINE_TIMEOUT: Code = Code::new("E064");
    pub const DATA_ERROR_ABORT: Code = Code::new("E065");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");

    pub const SOURCE_DRAINED: Code = Code::new("I010");
    pub const LOOKAHEAD_COMPLETE: Code = Code::new("I015");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const TRIPLET_WINDOWING_COMPLETE: Code = Code::new("I040");
    pub const PIPELINE_COMPLETE: Code = Code::new("I060");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

/// Error metadata registry using OnceLock for thread safety
static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

/// Initialize and get the error registry
fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let mut registry = HashMap::new();

        // System errors
        registry.insert(
            "ERR001",
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal system error",
                "File a bug report with the input that triggered it",
            ),
        );
        registry.insert(
            "ERR002",
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "System initialization failed",
                "Check logging and runtime configuration",
            ),
        );
        registry.insert(
            "ERR003",
            ErrorMetadata::new(
                "ERR003",
                "System",
                Severity::High,
                false,
                true,
                "Runtime configuration is invalid",
                "Fix the configuration file or SHUNT_* environment variables",
            ),
        );

        // Byte source errors
        registry.insert(
            "E005",
            ErrorMetadata::new(
                "E005",
                "Source",
                Severity::High,
                false,
                true,
                "Input source could not be opened",
                "Check the input path and its permissions",
            ),
        );
        registry.insert(
            "E006",
            ErrorMetadata::new(
                "E006",
                "Source",
                Severity::Medium,
                true,
                false,
                "Read error on the input source, treated as end of stream",
                "Check the input device; output may be truncated",
            ),
        );

        // Lexical data errors
        registry.insert(
            "E020",
            ErrorMetadata::new(
                "E020",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "Token exceeded the accumulation buffer and was truncated",
                "Shorten the operand or string, or raise max_token_length",
            ),
        );
        registry.insert(
            "E021",
            ErrorMetadata::new(
                "E021",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "String literal not terminated before end of stream",
                "Add the closing quote",
            ),
        );
        registry.insert(
            "E022",
            ErrorMetadata::new(
                "E022",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Backslash sequence other than an escaped quote passed through unchanged",
                "Only escaped matching quotes are resolved inside strings",
            ),
        );
        registry.insert(
            "E023",
            ErrorMetadata::new(
                "E023",
                "Lexical",
                Severity::Critical,
                false,
                true,
                "Character frame received after end of stream",
                "Stage ordering defect: report the producer",
            ),
        );

        // Triplet errors
        registry.insert(
            "E040",
            ErrorMetadata::new(
                "E040",
                "Triplet",
                Severity::Critical,
                false,
                true,
                "Token received after EndOfStream",
                "Stage ordering defect: report the producer",
            ),
        );

        // Pipeline errors
        registry.insert(
            "E060",
            ErrorMetadata::new(
                "E060",
                "Pipeline",
                Severity::Critical,
                false,
                true,
                "Stage input closed before its terminal item",
                "An upstream stage stopped early; check earlier errors",
            ),
        );
        registry.insert(
            "E061",
            ErrorMetadata::new(
                "E061",
                "Pipeline",
                Severity::High,
                false,
                true,
                "Downstream stage dropped its receiver",
                "A later stage failed; check earlier errors",
            ),
        );
        registry.insert(
            "E062",
            ErrorMetadata::new(
                "E062",
                "Pipeline",
                Severity::Critical,
                false,
                true,
                "Stage task panicked",
                "File a bug report with the input that triggered it",
            ),
        );
        registry.insert(
            "E063",
            ErrorMetadata::new(
                "E063",
                "Pipeline",
                Severity::Medium,
                true,
                true,
                "Pipeline cancelled",
                "Re-run the pipeline if the cancellation was not intended",
            ),
        );
        registry.insert(
            "E064",
            ErrorMetadata::new(
                "E064",
                "Pipeline",
                Severity::High,
                true,
                true,
                "Pipeline exceeded its timeout",
                "Check for a stalled producer or raise timeout_ms",
            ),
        );
        registry.insert(
            "E065",
            ErrorMetadata::new(
                "E065",
                "Pipeline",
                Severity::Medium,
                true,
                true,
                "Pipeline aborted on first data error",
                "Fix the reported data error or disable abort_on_data_error",
            ),
        );

        // Success codes
        registry.insert(
            "I004",
            ErrorMetadata::new(
                "I004",
                "System",
                Severity::Low,
                true,
                false,
                "System initialization completed",
                "Continue",
            ),
        );
        registry.insert(
            "I010",
            ErrorMetadata::new(
                "I010",
                "Source",
                Severity::Low,
                true,
                false,
                "Input source drained",
                "Continue to byte lookahead",
            ),
        );
        registry.insert(
            "I015",
            ErrorMetadata::new(
                "I015",
                "Lookahead",
                Severity::Low,
                true,
                false,
                "Byte lookahead stage completed",
                "Continue to lexing",
            ),
        );
        registry.insert(
            "I020",
            ErrorMetadata::new(
                "I020",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Tokenization completed",
                "Continue to triplet windowing",
            ),
        );
        registry.insert(
            "I040",
            ErrorMetadata::new(
                "I040",
                "Triplet",
                Severity::Low,
                true,
                false,
                "Triplet windowing completed",
                "Hand windows to the consumer",
            ),
        );
        registry.insert(
            "I060",
            ErrorMetadata::new(
                "I060",
                "Pipeline",
                Severity::Low,
                true,
                false,
                "Pipeline run completed",
                "None",
            ),
        );

        registry
    })
}

/// Registry entry for a code, if it has one
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}
