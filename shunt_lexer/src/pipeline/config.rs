//! Validated pipeline configuration

use super::PipelineError;
use crate::config::compile_time::{channels, logging, pipeline};
use crate::config::runtime::{LexicalPreferences, RuntimeConfig};
use crate::log_warning;
use crate::tokens::PartialWindowPolicy;
use std::time::Duration;

/// Bounded capacities for each stage channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCapacities {
    pub bytes: usize,
    pub frames: usize,
    pub tokens: usize,
    pub triplets: usize,
    pub diagnostics: usize,
}

impl Default for ChannelCapacities {
    fn default() -> Self {
        Self {
            bytes: channels::BYTE_CHANNEL_CAPACITY,
            frames: channels::FRAME_CHANNEL_CAPACITY,
            tokens: channels::TOKEN_CHANNEL_CAPACITY,
            triplets: channels::TRIPLET_CHANNEL_CAPACITY,
            diagnostics: channels::DIAGNOSTIC_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub lexical: LexicalPreferences,
    pub partial_windows: PartialWindowPolicy,
    pub abort_on_data_error: bool,
    pub timeout: Duration,
    pub capacities: ChannelCapacities,
    pub read_chunk_size: usize,
    /// Diagnostics kept for the caller; the rest are only counted
    pub max_diagnostics: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lexical: LexicalPreferences::default(),
            partial_windows: PartialWindowPolicy::default(),
            abort_on_data_error: false,
            timeout: Duration::from_millis(pipeline::DEFAULT_TIMEOUT_MS),
            capacities: ChannelCapacities::default(),
            read_chunk_size: channels::READ_CHUNK_SIZE,
            max_diagnostics: logging::MAX_ERROR_COLLECTION,
        }
    }
}

impl PipelineConfig {
    /// Build from runtime preferences. Timeouts above the compile-time
    /// maximum are clamped; a zero timeout is rejected.
    pub fn from_runtime(runtime: &RuntimeConfig) -> Result<Self, PipelineError> {
        let requested = runtime.pipeline.timeout_ms;
        if requested == 0 {
            return Err(PipelineError::invalid_configuration(
                "timeout_ms must be greater than zero",
            ));
        }

        let timeout_ms = if requested > pipeline::MAX_TIMEOUT_MS {
            log_warning!(code = crate::logging::codes::system::CONFIGURATION_ERROR,
                "Pipeline timeout clamped to the build maximum",
                "requested_ms" => requested,
                "max_ms" => pipeline::MAX_TIMEOUT_MS
            );
            pipeline::MAX_TIMEOUT_MS
        } else {
            requested
        };

        let config = Self {
            lexical: runtime.lexical.clone(),
            partial_windows: runtime.pipeline.partial_windows,
            abort_on_data_error: runtime.pipeline.abort_on_data_error,
            timeout: Duration::from_millis(timeout_ms),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.timeout.is_zero() {
            return Err(PipelineError::invalid_configuration(
                "timeout must be greater than zero",
            ));
        }
        if self.timeout > Duration::from_millis(pipeline::MAX_TIMEOUT_MS) {
            return Err(PipelineError::invalid_configuration(format!(
                "timeout exceeds maximum of {} ms",
                pipeline::MAX_TIMEOUT_MS
            )));
        }

        let capacities = [
            ("bytes", self.capacities.bytes),
            ("frames", self.capacities.frames),
            ("tokens", self.capacities.tokens),
            ("triplets", self.capacities.triplets),
            ("diagnostics", self.capacities.diagnostics),
        ];
        if let Some((name, _)) = capacities.iter().find(|(_, capacity)| *capacity == 0) {
            return Err(PipelineError::invalid_configuration(format!(
                "{} channel capacity must be greater than zero",
                name
            )));
        }

        if self.read_chunk_size == 0 {
            return Err(PipelineError::invalid_configuration(
                "read_chunk_size must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_partial_windows(mut self, policy: PartialWindowPolicy) -> Self {
        self.partial_windows = policy;
        self
    }

    pub fn with_abort_on_data_error(mut self, abort: bool) -> Self {
        self.abort_on_data_error = abort;
        self
    }

    pub fn with_capacities(mut self, capacities: ChannelCapacities) -> Self {
        self.capacities = capacities;
        self
    }

    pub fn with_lexical(mut self, lexical: LexicalPreferences) -> Self {
        self.lexical = lexical;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_runtime_timeout_is_clamped() {
        let mut runtime = RuntimeConfig::default();
        runtime.pipeline.timeout_ms = pipeline::MAX_TIMEOUT_MS + 1;
        let config = PipelineConfig::from_runtime(&runtime).unwrap();
        assert_eq!(config.timeout_ms(), pipeline::MAX_TIMEOUT_MS);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut runtime = RuntimeConfig::default();
        runtime.pipeline.timeout_ms = 0;
        assert_matches!(
            PipelineConfig::from_runtime(&runtime),
            Err(PipelineError::InvalidConfiguration { .. })
        );
    }

    #[test]
    fn test_runtime_preferences_carry_over() {
        let mut runtime = RuntimeConfig::default();
        runtime.pipeline.timeout_ms = 250;
        runtime.pipeline.abort_on_data_error = true;
        runtime.pipeline.partial_windows = PartialWindowPolicy::Fill;

        let config = PipelineConfig::from_runtime(&runtime).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(config.abort_on_data_error);
        assert_eq!(config.partial_windows, PartialWindowPolicy::Fill);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let config = PipelineConfig::default().with_capacities(ChannelCapacities {
            frames: 0,
            ..ChannelCapacities::default()
        });
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("frames"));
    }
}
