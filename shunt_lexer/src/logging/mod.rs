//! Global logging module
//!
//! Coded events go through one process-wide [`LoggingService`]. Every macro
//! is a no-op until `init_global_logging` runs, so the library stays silent
//! when embedded.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use crate::utils::Span;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

/// Install the global service built from the runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    // Data diagnostics and fatal pipeline errors must resolve to metadata
    let required_codes = [
        codes::system::INTERNAL_ERROR,
        codes::system::INITIALIZATION_FAILURE,
        codes::lexical::TOKEN_TOO_LONG,
        codes::lexical::UNTERMINATED_STRING,
        codes::pipeline::TRUNCATED_STREAM,
    ];
    for code in required_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!("Missing metadata for error code: {}", code));
        }
    }

    let service = Arc::new(LoggingService::with_config());
    GLOBAL_LOGGER
        .set(service.clone())
        .map_err(|_| "Global logger already initialized")?;

    service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));
    Ok(())
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

/// Log a startup failure. Before the global service exists the event goes
/// straight to stderr.
pub fn report_initialization_failure(message: &str) -> LogEvent {
    let event = LogEvent::error(codes::system::INITIALIZATION_FAILURE, message);
    match try_get_global_logger() {
        Some(logger) => logger.log_event(event.clone()),
        None => ConsoleLogger::new(LogLevel::Error).log(&event),
    }
    event
}

fn bounded_message(message: &mut String) {
    let limit = config::get_max_log_message_length();
    if message.len() <= limit {
        return;
    }
    let mut end = limit;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message.truncate(end);
}

/// Macro back end: attach span and context, then hand the event to the
/// global service if there is one
#[doc(hidden)]
pub fn emit(mut event: LogEvent, span: Option<Span>, context: Vec<(&str, String)>) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };

    bounded_message(&mut event.message);
    if let Some(span) = span {
        event = event.with_span(span);
    }
    for (key, value) in context {
        event = event.with_context(key, &value);
    }
    logger.log_event(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_message_respects_char_boundaries() {
        let limit = config::get_max_log_message_length();
        let mut long = "é".repeat(limit);
        bounded_message(&mut long);
        assert!(long.len() <= limit);
        assert!(long.chars().all(|c| c == 'é'));

        let mut short = "short".to_string();
        bounded_message(&mut short);
        assert_eq!(short, "short");
    }

    #[test]
    fn test_initialization_failure_is_coded_and_halting() {
        let event = report_initialization_failure("Runtime preferences already initialized");

        assert!(event.is_error());
        assert_eq!(event.code, codes::system::INITIALIZATION_FAILURE);
        let metadata = event.metadata().unwrap();
        assert!(metadata.requires_halt);
        assert!(event.format_detailed().contains("System initialization failed"));
    }
}
