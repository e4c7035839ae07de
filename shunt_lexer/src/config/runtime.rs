// RUNTIME PREFERENCES (User Experience)

use crate::config::compile_time::{lexical, pipeline};
use crate::output::OutputFormat;
use crate::tokens::PartialWindowPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalPreferences {
    /// Whether backslash sequences other than an escaped quote raise a diagnostic
    pub report_unrecognized_escapes: bool,

    /// Whether to show position information in diagnostics
    pub include_position_in_errors: bool,

    /// Accumulation buffer bound, clamped to the compile-time maximum
    pub max_token_length: usize,

    /// Whether to count occurrences of each operator text in the metrics
    pub track_operator_patterns: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            report_unrecognized_escapes: env::var("SHUNT_LEXICAL_REPORT_ESCAPES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            include_position_in_errors: env::var("SHUNT_LEXICAL_INCLUDE_POSITIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            max_token_length: env::var("SHUNT_LEXICAL_MAX_TOKEN_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(lexical::MAX_TOKEN_LENGTH),
            track_operator_patterns: env::var("SHUNT_LEXICAL_TRACK_OPERATORS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

impl LexicalPreferences {
    /// Token length bound actually enforced by the lexer
    pub fn effective_max_token_length(&self) -> usize {
        self.max_token_length.clamp(1, lexical::MAX_TOKEN_LENGTH)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelinePreferences {
    /// Wall-clock limit for a whole run, clamped to the compile-time maximum
    pub timeout_ms: u64,

    /// Whether the first data diagnostic cancels the run
    pub abort_on_data_error: bool,

    /// How the triplet stage treats the first two tokens
    pub partial_windows: PartialWindowPolicy,
}

impl Default for PipelinePreferences {
    fn default() -> Self {
        Self {
            timeout_ms: env::var("SHUNT_PIPELINE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(pipeline::DEFAULT_TIMEOUT_MS),
            abort_on_data_error: env::var("SHUNT_PIPELINE_ABORT_ON_DATA_ERROR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            partial_windows: env::var("SHUNT_PIPELINE_PARTIAL_WINDOWS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPreferences {
    /// Record or JSON-lines rendering
    pub format: OutputFormat,

    /// Emit triplet windows instead of single tokens
    pub emit_triplets: bool,

    /// Print a JSON run summary to stderr after the output
    pub include_summary: bool,
}

impl Default for OutputPreferences {
    fn default() -> Self {
        Self {
            format: env::var("SHUNT_OUTPUT_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            emit_triplets: env::var("SHUNT_OUTPUT_TRIPLETS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            include_summary: env::var("SHUNT_OUTPUT_SUMMARY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Preferred minimum log level
    pub min_log_level: LogLevel,

    /// Whether to log per-stage completion metrics
    pub log_performance_events: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var("SHUNT_LOGGING_USE_STRUCTURED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var("SHUNT_LOGGING_ENABLE_CONSOLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            min_log_level: env::var("SHUNT_LOGGING_MIN_LEVEL")
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Warning),
            log_performance_events: env::var("SHUNT_LOGGING_LOG_PERFORMANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub lexical: LexicalPreferences,
    pub pipeline: PipelinePreferences,
    pub output: OutputPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse preferences from TOML; missing sections and keys fall back to
    /// the environment-derived defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Lexical
    pub const LEXICAL_REPORT_ESCAPES: &str = "SHUNT_LEXICAL_REPORT_ESCAPES";
    pub const LEXICAL_INCLUDE_POSITIONS: &str = "SHUNT_LEXICAL_INCLUDE_POSITIONS";
    pub const LEXICAL_MAX_TOKEN_LENGTH: &str = "SHUNT_LEXICAL_MAX_TOKEN_LENGTH";
    pub const LEXICAL_TRACK_OPERATORS: &str = "SHUNT_LEXICAL_TRACK_OPERATORS";

    // Pipeline
    pub const PIPELINE_TIMEOUT_MS: &str = "SHUNT_PIPELINE_TIMEOUT_MS";
    pub const PIPELINE_ABORT_ON_DATA_ERROR: &str = "SHUNT_PIPELINE_ABORT_ON_DATA_ERROR";
    pub const PIPELINE_PARTIAL_WINDOWS: &str = "SHUNT_PIPELINE_PARTIAL_WINDOWS";

    // Output
    pub const OUTPUT_FORMAT: &str = "SHUNT_OUTPUT_FORMAT";
    pub const OUTPUT_TRIPLETS: &str = "SHUNT_OUTPUT_TRIPLETS";
    pub const OUTPUT_SUMMARY: &str = "SHUNT_OUTPUT_SUMMARY";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "SHUNT_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "SHUNT_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "SHUNT_LOGGING_MIN_LEVEL";
    pub const LOGGING_LOG_PERFORMANCE: &str = "SHUNT_LOGGING_LOG_PERFORMANCE";
}
