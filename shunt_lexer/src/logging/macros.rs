//! Coded logging macros
//!
//! Context values accept anything implementing Display:
//! `log_warning!(code = codes::lexical::TOKEN_TOO_LONG, "Token truncated", span = s, "limit" => 1024)`
//!
//! Arms taking `span =` come first so the span is never parsed as a
//! context key.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_fields {
    ($($key:expr => $value:expr),*) => {
        ::std::vec![$(($key, ::std::format!("{}", $value))),*]
    };
}

#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr, span = $span:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::emit(
            $crate::logging::LogEvent::error($code, $message),
            Some($span),
            $crate::__log_fields!($($key => $value),*),
        )
    };
    ($code:expr, $message:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::emit(
            $crate::logging::LogEvent::error($code, $message),
            None,
            $crate::__log_fields!($($key => $value),*),
        )
    };
}

/// `code = ...` selects a registry code; without it the warning is uncoded
#[macro_export]
macro_rules! log_warning {
    (code = $code:expr, $message:expr, span = $span:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::emit(
            $crate::logging::LogEvent::warning_with_code($code, $message),
            Some($span),
            $crate::__log_fields!($($key => $value),*),
        )
    };
    (code = $code:expr, $message:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::emit(
            $crate::logging::LogEvent::warning_with_code($code, $message),
            None,
            $crate::__log_fields!($($key => $value),*),
        )
    };
    ($message:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::emit(
            $crate::logging::LogEvent::warning($message),
            None,
            $crate::__log_fields!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::emit(
            $crate::logging::LogEvent::success($code, $message),
            None,
            $crate::__log_fields!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::emit(
            $crate::logging::LogEvent::info($message),
            None,
            $crate::__log_fields!($($key => $value),*),
        )
    };
}

/// Context is not formatted unless Debug is enabled
#[macro_export]
macro_rules! log_debug {
    ($message:expr $(, $key:expr => $value:expr)*) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            $crate::logging::emit(
                $crate::logging::LogEvent::debug($message),
                None,
                $crate::__log_fields!($($key => $value),*),
            )
        }
    };
}

/// Throughput and timing, gated on the log_performance_events preference
#[macro_export]
macro_rules! log_performance {
    ($code:expr, $message:expr, duration = $duration:expr $(, $key:expr => $value:expr)*) => {
        if $crate::logging::config::log_performance_events() {
            $crate::log_success!($code, $message,
                "duration_ms" => $duration.as_secs_f64() * 1000.0
                $(, $key => $value)*
            )
        }
    };
}
